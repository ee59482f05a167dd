//! Scoped thread attachment
//!
//! Attachments are counted per thread. The first guard on a thread attaches
//! it to the host runtime, the last guard to drop detaches it, so every exit
//! path of a callback releases what it acquired.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};
use parking_lot::Mutex;
use super::runtime::{HostError, HostRuntime};

/// Per-thread attachment depth
pub struct ThreadAttachments {
    depth: Mutex<HashMap<ThreadId, usize>>,
}

impl ThreadAttachments {
    pub fn new() -> Self {
        Self {
            depth: Mutex::new(HashMap::new()),
        }
    }

    /// Attach the calling thread (or deepen an existing attachment)
    pub fn acquire<'a>(&'a self, runtime: &'a dyn HostRuntime) -> Result<AttachGuard<'a>, HostError> {
        let id = thread::current().id();

        // Only this thread ever touches its own entry, so the lock is not
        // held across the runtime call.
        let nested = {
            let mut depth = self.depth.lock();
            match depth.get_mut(&id) {
                Some(count) => {
                    *count += 1;
                    true
                }
                None => false,
            }
        };

        if !nested {
            runtime.attach_current_thread()?;
            self.depth.lock().insert(id, 1);
            tracing::trace!(thread = ?id, "thread attached to host runtime");
        }

        Ok(AttachGuard {
            attachments: self,
            runtime,
            _thread_bound: PhantomData,
        })
    }

    fn release(&self, runtime: &dyn HostRuntime) {
        let id = thread::current().id();
        let last = {
            let mut depth = self.depth.lock();
            match depth.get_mut(&id) {
                Some(count) if *count > 1 => {
                    *count -= 1;
                    false
                }
                Some(_) => {
                    depth.remove(&id);
                    true
                }
                None => false,
            }
        };

        if last {
            runtime.detach_current_thread();
            tracing::trace!(thread = ?id, "thread detached from host runtime");
        }
    }

    /// Attachment depth of the calling thread
    pub fn current_depth(&self) -> usize {
        let id = thread::current().id();
        self.depth.lock().get(&id).copied().unwrap_or(0)
    }

    /// Number of threads holding at least one guard
    pub fn attached_threads(&self) -> usize {
        self.depth.lock().len()
    }
}

impl Default for ThreadAttachments {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that the calling thread is attached; released on drop
///
/// Bound to the thread that acquired it.
#[must_use = "the thread is detached as soon as the guard drops"]
pub struct AttachGuard<'a> {
    attachments: &'a ThreadAttachments,
    runtime: &'a dyn HostRuntime,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for AttachGuard<'_> {
    fn drop(&mut self) {
        self.attachments.release(self.runtime);
    }
}
