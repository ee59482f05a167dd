//! Record arena
//!
//! Native records handed to the host are parked here; the host object only
//! carries the integer handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::RwLock;
use crate::types::ObjectHandle;
use super::record::{ClassObject, ResultRecord};

/// Thread-safe table of live result records
pub struct RecordArena {
    entries: RwLock<HashMap<ObjectHandle, ResultRecord>>,
    next: AtomicU64,
}

impl RecordArena {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }

    /// Take ownership of a record and return its handle
    pub fn insert(&self, record: ResultRecord) -> ObjectHandle {
        let handle = ObjectHandle::new(self.next.fetch_add(1, Ordering::Relaxed));
        self.entries.write().insert(handle, record);
        handle
    }

    /// Run `f` against a live record
    pub fn with_record<R>(&self, handle: ObjectHandle, f: impl FnOnce(&dyn ClassObject) -> R) -> Option<R> {
        let entries = self.entries.read();
        entries.get(&handle).map(|record| f(record.object()))
    }

    /// Remove a record, returning it to the caller
    pub fn release(&self, handle: ObjectHandle) -> Option<ResultRecord> {
        if handle.is_released() {
            return None;
        }
        self.entries.write().remove(&handle)
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.entries.read().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Release every record; returns how many were live
    pub fn clear(&self) -> usize {
        let drained: Vec<ResultRecord> = {
            let mut entries = self.entries.write();
            entries.drain().map(|(_, record)| record).collect()
        };
        drained.len()
    }
}

impl Default for RecordArena {
    fn default() -> Self {
        Self::new()
    }
}
