//! Bridge context
//!
//! Everything the sinks share: the host runtime, per-thread attachment
//! bookkeeping, the record arena and the result object factory. A bridge is
//! built once by the embedding host and passed around by `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::host::{AttachGuard, HostError, HostRuntime, ThreadAttachments};
use crate::objects::{RecordArena, ResultObjectFactory};

/// Default number of buffered records that triggers a flush
pub const DEFAULT_BATCH_THRESHOLD: usize = 1000;

/// Bridge configuration
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Buffered record count at which `indicate` flushes to the host
    pub batch_threshold: usize,
    /// Add `WBEM_FLAG_DIRECT_READ` to queries
    pub direct_read: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            direct_read: true,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration with the given flush threshold
    pub fn new(batch_threshold: usize) -> Self {
        Self {
            batch_threshold: batch_threshold.max(1),
            ..Self::default()
        }
    }

    pub fn with_batch_threshold(mut self, batch_threshold: usize) -> Self {
        self.batch_threshold = batch_threshold.max(1);
        self
    }

    pub fn with_direct_read(mut self, direct_read: bool) -> Self {
        self.direct_read = direct_read;
        self
    }
}

/// Shared bridge state
pub struct RuntimeBridge {
    /// Configuration
    config: BridgeConfig,
    /// Embedding host runtime
    runtime: Arc<dyn HostRuntime>,
    /// Attachment depth per provider thread
    attachments: ThreadAttachments,
    /// Native records handed to the host
    arena: Arc<RecordArena>,
    /// Wraps records into host objects
    factory: ResultObjectFactory,
    /// Cleared by `shutdown`
    running: AtomicBool,
}

impl RuntimeBridge {
    pub fn new(runtime: Arc<dyn HostRuntime>, config: BridgeConfig) -> Arc<Self> {
        let arena = Arc::new(RecordArena::new());
        let factory = ResultObjectFactory::new(runtime.clone(), arena.clone());

        Arc::new(Self {
            config,
            runtime,
            attachments: ThreadAttachments::new(),
            arena,
            factory,
            running: AtomicBool::new(true),
        })
    }

    /// Create with default configuration
    pub fn with_runtime(runtime: Arc<dyn HostRuntime>) -> Arc<Self> {
        Self::new(runtime, BridgeConfig::default())
    }

    /// Attach the calling thread for the lifetime of the guard
    pub fn attach(&self) -> Result<AttachGuard<'_>, HostError> {
        if !self.is_running() {
            return Err(HostError::ShutDown);
        }
        self.attachments.acquire(self.runtime.as_ref())
    }

    /// Attachment depth of the calling thread
    pub fn attach_depth(&self) -> usize {
        self.attachments.current_depth()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Arc<dyn HostRuntime> {
        &self.runtime
    }

    pub fn factory(&self) -> &ResultObjectFactory {
        &self.factory
    }

    pub fn arena(&self) -> &Arc<RecordArena> {
        &self.arena
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop attaching threads and release every record still held for the host
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        let released = self.arena.clear();
        tracing::info!(released, "bridge shut down");
    }
}
