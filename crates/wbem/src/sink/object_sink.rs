//! Asynchronous result sink
//!
//! One sink exists per in-flight request. Provider threads push records
//! through [`WbemObjectSink::indicate`] and finish with
//! [`WbemObjectSink::set_status`]; the sink batches the records and forwards
//! them to the host handler.
//!
//! Locking:
//! - `buffer` covers append, threshold check and swap; it is never held
//!   while waiting for another lock
//! - `flush_order` is taken before a batch is swapped out and held while
//!   talking to the handler, so deliveries for one sink never overlap and
//!   keep their order
//! - `flush_order` is reentrant: a handler may cancel its own request from
//!   inside `deliver` and the provider may answer with `set_status` on the
//!   same thread
//! - lock order is `flush_order` then `buffer`; `state` and `handler` are
//!   leaf locks

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use parking_lot::{Mutex, ReentrantMutex};
use crate::bridge::RuntimeBridge;
use crate::host::{guard_host_call, handler_key, HandlerRef, SinkStatus};
use crate::objects::{HostResultObject, ResultRecord};
use crate::types::{flags, hresult, HResult, SinkId};
use super::registry::SinkRegistry;
use super::state::SinkState;

/// Native sink contract called by the provider
///
/// Both calls may arrive concurrently from any provider thread and always
/// return `WBEM_S_NO_ERROR`.
pub trait WbemObjectSink: Send + Sync {
    /// Deliver a batch of result records
    fn indicate(&self, records: Vec<ResultRecord>) -> HResult;

    /// Report progress or the final status
    fn set_status(
        &self,
        status_flags: i32,
        hr: HResult,
        param: Option<String>,
        record: Option<ResultRecord>,
    ) -> HResult;
}

/// Buffering sink bound to one host handler
pub struct AsyncResultSink {
    id: SinkId,
    bridge: Arc<RuntimeBridge>,
    registry: Weak<SinkRegistry>,
    /// Released on the terminal status
    handler: Mutex<Option<HandlerRef>>,
    /// Identity of the handler, valid after release
    handler_key: usize,
    threshold: usize,
    buffer: Mutex<Vec<ResultRecord>>,
    flush_order: ReentrantMutex<()>,
    state: Mutex<SinkState>,
    cancel_requested: AtomicBool,
    delivered: AtomicU64,
    flushes: AtomicU64,
}

impl AsyncResultSink {
    pub fn new(
        bridge: Arc<RuntimeBridge>,
        registry: &Arc<SinkRegistry>,
        handler: HandlerRef,
    ) -> Arc<Self> {
        let threshold = bridge.config().batch_threshold.max(1);
        Arc::new(Self {
            id: SinkId::generate(),
            registry: Arc::downgrade(registry),
            handler_key: handler_key(&handler),
            handler: Mutex::new(Some(handler)),
            threshold,
            buffer: Mutex::new(Vec::new()),
            flush_order: ReentrantMutex::new(()),
            state: Mutex::new(SinkState::Idle),
            cancel_requested: AtomicBool::new(false),
            delivered: AtomicU64::new(0),
            flushes: AtomicU64::new(0),
            bridge,
        })
    }

    pub fn id(&self) -> SinkId {
        self.id
    }

    pub(crate) fn handler_key(&self) -> usize {
        self.handler_key
    }

    pub fn state(&self) -> SinkState {
        *self.state.lock()
    }

    /// Mark the request as issued
    pub fn activate(&self) {
        let mut state = self.state.lock();
        if *state == SinkState::Idle {
            *state = SinkState::Active;
        }
    }

    /// Record that the host cancelled this request
    pub fn mark_cancel_requested(&self) {
        self.cancel_requested.store(true, Ordering::Release);
    }

    pub(crate) fn clear_cancel_requested(&self) {
        self.cancel_requested.store(false, Ordering::Release);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// Whether the host handler is still held
    pub fn has_handler(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Records buffered and not yet delivered
    pub fn pending(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Objects handed to the host so far
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Number of batches handed to the host so far
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Buffer records, flushing on the calling thread at the threshold
    pub fn deliver_results(&self, records: Vec<ResultRecord>) {
        if records.is_empty() {
            return;
        }
        if self.state().is_terminal() {
            tracing::debug!(sink = %self.id, count = records.len(), "releasing results for finished sink");
            return;
        }

        let pending = {
            let mut buffer = self.buffer.lock();
            buffer.extend(records);
            buffer.len()
        };
        if pending < self.threshold {
            return;
        }

        let _attach = match self.bridge.attach() {
            Ok(guard) => guard,
            Err(err) => {
                tracing::error!(
                    sink = %self.id,
                    pending,
                    "can't attach to host runtime, keeping results buffered: {}",
                    err
                );
                return;
            }
        };

        let _order = self.flush_order.lock();
        let batch = {
            let mut buffer = self.buffer.lock();
            // another thread may have flushed while this one waited
            if buffer.len() < self.threshold {
                return;
            }
            mem::take(&mut *buffer)
        };

        self.transition(SinkState::Active, SinkState::Flushing);
        self.flush(batch);
        self.transition(SinkState::Flushing, SinkState::Active);
    }

    /// Flush, report status and, on a terminal status, finish the sink
    pub fn report_status(
        &self,
        status_flags: i32,
        hr: HResult,
        param: Option<String>,
        record: Option<ResultRecord>,
    ) {
        let attach = self.bridge.attach();
        let _order = self.flush_order.lock();
        let pending = mem::take(&mut *self.buffer.lock());

        let status = SinkStatus::from_flags(status_flags, hr);
        let terminal = status_flags == flags::WBEM_STATUS_COMPLETE || hr.is_failure();

        match &attach {
            Ok(_) => {
                if !pending.is_empty() {
                    self.flush(pending);
                }
                self.notify_status(status, hr, param, record);
            }
            Err(err) => {
                tracing::error!(
                    sink = %self.id,
                    released = pending.len() + usize::from(record.is_some()),
                    "can't attach to host runtime, dropping {} status: {}",
                    status,
                    err
                );
            }
        }

        if terminal {
            self.finish(hr);
        }
    }

    fn current_handler(&self) -> Option<HandlerRef> {
        self.handler.lock().clone()
    }

    fn transition(&self, from: SinkState, to: SinkState) {
        let mut state = self.state.lock();
        if *state == from {
            *state = to;
        }
    }

    /// Hand a batch to the host; caller holds `flush_order` and an attachment
    fn flush(&self, batch: Vec<ResultRecord>) {
        let Some(handler) = self.current_handler() else {
            return;
        };

        let objects = self.bridge.factory().wrap_all(batch);
        let count = objects.len();
        if let Err(err) = guard_host_call(|| handler.deliver(objects)) {
            tracing::warn!(sink = %self.id, count, "result handler failed to take results: {}", err);
        }
        self.delivered.fetch_add(count as u64, Ordering::Relaxed);
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    fn notify_status(&self, status: SinkStatus, hr: HResult, param: Option<String>, record: Option<ResultRecord>) {
        let Some(handler) = self.current_handler() else {
            tracing::debug!(sink = %self.id, %status, "status after handler release ignored");
            return;
        };

        let object: Option<HostResultObject> = record.and_then(|record| match self.bridge.factory().wrap(record) {
            Ok(object) => Some(object),
            Err(err) => {
                tracing::warn!(sink = %self.id, "can't instantiate status object: {}", err.error);
                None
            }
        });
        let message = param.or_else(|| hr.is_failure().then(|| hr.diagnostic()));

        if let Err(err) = guard_host_call(|| handler.status(status, hr, message, object)) {
            tracing::warn!(sink = %self.id, %status, "result handler failed to take status: {}", err);
        }
    }

    fn finish(&self, hr: HResult) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self);
        }
        let handler = self.handler.lock().take();

        let final_state = if self.is_cancel_requested() || hr == hresult::WBEM_E_CALL_CANCELLED {
            SinkState::Cancelled
        } else if hr.is_failure() {
            SinkState::Failed
        } else {
            SinkState::Completed
        };
        {
            let mut state = self.state.lock();
            if !state.is_terminal() {
                *state = final_state;
            }
        }
        drop(handler);

        tracing::debug!(
            sink = %self.id,
            state = ?final_state,
            delivered = self.delivered(),
            "sink finished ({})",
            hr
        );
    }
}

impl WbemObjectSink for AsyncResultSink {
    fn indicate(&self, records: Vec<ResultRecord>) -> HResult {
        self.deliver_results(records);
        hresult::WBEM_S_NO_ERROR
    }

    fn set_status(
        &self,
        status_flags: i32,
        hr: HResult,
        param: Option<String>,
        record: Option<ResultRecord>,
    ) -> HResult {
        self.report_status(status_flags, hr, param, record);
        hresult::WBEM_S_NO_ERROR
    }
}

impl std::fmt::Debug for AsyncResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncResultSink")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .finish()
    }
}
