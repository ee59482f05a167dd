//! Registry of in-flight sinks
//!
//! A sink is registered when its request is issued and removed on its
//! terminal status or on cancellation, whichever comes first. Removal is
//! idempotent. The lock is never held across host callbacks, and removed
//! sinks are dropped after it is released.

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;
use crate::host::{handler_key, HandlerRef};
use crate::types::SinkId;
use super::object_sink::AsyncResultSink;

/// In-flight sinks, keyed by sink ID
pub struct SinkRegistry {
    sinks: Mutex<HashMap<SinkId, Arc<AsyncResultSink>>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self {
            sinks: Mutex::new(HashMap::new()),
        }
    }

    /// Track a sink
    pub fn register(&self, sink: Arc<AsyncResultSink>) {
        let id = sink.id();
        self.sinks.lock().insert(id, sink);
        tracing::trace!(sink = %id, "registered sink");
    }

    /// Stop tracking a sink; false if it was not registered
    pub fn remove(&self, sink: &AsyncResultSink) -> bool {
        let removed = self.sinks.lock().remove(&sink.id());
        removed.is_some()
    }

    /// Sink created for this handler, if its request is still in flight
    pub fn find_by_handler(&self, handler: &HandlerRef) -> Option<Arc<AsyncResultSink>> {
        let key = handler_key(handler);
        self.sinks
            .lock()
            .values()
            .find(|sink| sink.handler_key() == key)
            .cloned()
    }

    pub fn contains(&self, id: SinkId) -> bool {
        self.sinks.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.lock().is_empty()
    }

    /// Remove and return every sink
    pub fn drain(&self) -> Vec<Arc<AsyncResultSink>> {
        self.sinks.lock().drain().map(|(_, sink)| sink).collect()
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
