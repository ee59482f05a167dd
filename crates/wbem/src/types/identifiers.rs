//! Bridge identifier types
//!
//! Host-visible code never sees native pointers. It sees these integer keys:
//! - ObjectHandle: a result record parked in the record arena
//! - SinkId: one asynchronous operation (used in logs)
//! - HostObjectRef: the host runtime's reference to an object shell

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle of a result record held in the record arena
///
/// Zero is the "released" sentinel: a host object whose handle reads zero
/// no longer owns a native record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectHandle(pub u64);

impl ObjectHandle {
    /// Sentinel for a released (or never attached) handle
    pub const RELEASED: ObjectHandle = ObjectHandle(0);

    /// Create a handle from its raw value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value as stored in host objects
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Check for the released sentinel
    pub fn is_released(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({:016x})", self.0)
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identifier of one asynchronous operation
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(pub u64);

impl SinkId {
    /// Allocate the next process-unique sink ID
    pub fn generate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SinkId({})", self.0)
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink-{}", self.0)
    }
}

/// Reference to an object allocated by the host runtime
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct HostObjectRef(pub u64);
