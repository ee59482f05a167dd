//! Host runtime trait and an in-process implementation
//!
//! A native thread must be attached to the host runtime before it calls any
//! host code, and host objects are allocated by the runtime.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use parking_lot::Mutex;
use thiserror::Error;
use crate::types::HostObjectRef;

/// Failures raised on the host side of the boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The calling thread could not be attached
    #[error("failed to attach thread to host runtime: {0}")]
    AttachFailed(String),

    /// The host refused to construct an object
    #[error("host object construction failed: {0}")]
    Construction(String),

    /// Host callback code raised an exception
    #[error("host callback raised: {0}")]
    Callback(String),

    /// Host callback code panicked
    #[error("host callback panicked: {0}")]
    Panicked(String),

    /// The bridge was shut down
    #[error("runtime bridge is shut down")]
    ShutDown,
}

/// The host runtime as seen from native threads
pub trait HostRuntime: Send + Sync + 'static {
    /// Attach the calling thread
    fn attach_current_thread(&self) -> Result<(), HostError>;

    /// Detach the calling thread
    fn detach_current_thread(&self);

    /// Allocate the host-side shell of a result object
    fn allocate_object(&self) -> Result<HostObjectRef, HostError>;
}

/// Host runtime living in the same process as the bridge
///
/// Tracks which threads are attached and how often attach/detach ran.
pub struct LocalRuntime {
    attached: Mutex<HashSet<ThreadId>>,
    attach_calls: AtomicUsize,
    detach_calls: AtomicUsize,
    next_object: AtomicU64,
}

impl LocalRuntime {
    pub fn new() -> Self {
        Self {
            attached: Mutex::new(HashSet::new()),
            attach_calls: AtomicUsize::new(0),
            detach_calls: AtomicUsize::new(0),
            next_object: AtomicU64::new(1),
        }
    }

    /// Whether the calling thread is attached
    pub fn is_current_thread_attached(&self) -> bool {
        self.attached.lock().contains(&thread::current().id())
    }

    /// Number of threads attached right now
    pub fn attached_threads(&self) -> usize {
        self.attached.lock().len()
    }

    pub fn attach_calls(&self) -> usize {
        self.attach_calls.load(Ordering::SeqCst)
    }

    pub fn detach_calls(&self) -> usize {
        self.detach_calls.load(Ordering::SeqCst)
    }

    /// Number of object shells allocated so far
    pub fn allocated_objects(&self) -> u64 {
        self.next_object.load(Ordering::SeqCst) - 1
    }
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for LocalRuntime {
    fn attach_current_thread(&self) -> Result<(), HostError> {
        self.attach_calls.fetch_add(1, Ordering::SeqCst);
        self.attached.lock().insert(thread::current().id());
        Ok(())
    }

    fn detach_current_thread(&self) {
        self.detach_calls.fetch_add(1, Ordering::SeqCst);
        self.attached.lock().remove(&thread::current().id());
    }

    fn allocate_object(&self) -> Result<HostObjectRef, HostError> {
        Ok(HostObjectRef(self.next_object.fetch_add(1, Ordering::SeqCst)))
    }
}
