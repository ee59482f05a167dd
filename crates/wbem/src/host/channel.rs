//! Channel-backed handler for async hosts
//!
//! Provider threads push events into an unbounded tokio channel; the host
//! consumes them as a `futures::Stream` on its own executor. The stream ends
//! after the terminal status.

use std::pin::Pin;
use std::task::{Context, Poll};
use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use crate::objects::HostResultObject;
use crate::types::HResult;
use super::handler::{ResultHandler, SinkStatus};
use super::runtime::HostError;

/// One callback from the bridge
#[derive(Debug)]
pub enum SinkEvent {
    Objects(Vec<HostResultObject>),
    Status {
        status: SinkStatus,
        hr: HResult,
        message: Option<String>,
        object: Option<HostResultObject>,
    },
}

/// Handler forwarding every callback into a channel
pub struct ChannelHandler {
    sender: Mutex<Option<mpsc::UnboundedSender<SinkEvent>>>,
}

impl ChannelHandler {
    fn send(&self, event: SinkEvent, close: bool) -> Result<(), HostError> {
        let mut sender = self.sender.lock();
        let result = match sender.as_ref() {
            Some(tx) => tx.send(event).map_err(|mpsc::error::SendError(event)| {
                dispose_event(event);
                HostError::Callback("result stream dropped".to_string())
            }),
            None => {
                dispose_event(event);
                Err(HostError::Callback("result stream already closed".to_string()))
            }
        };
        if close {
            sender.take();
        }
        result
    }
}

fn dispose_event(event: SinkEvent) {
    match event {
        SinkEvent::Objects(objects) => {
            for object in objects {
                object.dispose();
            }
        }
        SinkEvent::Status { object, .. } => {
            if let Some(object) = object {
                object.dispose();
            }
        }
    }
}

impl ResultHandler for ChannelHandler {
    fn deliver(&self, objects: Vec<HostResultObject>) -> Result<(), HostError> {
        self.send(SinkEvent::Objects(objects), false)
    }

    fn status(
        &self,
        status: SinkStatus,
        hr: HResult,
        message: Option<String>,
        object: Option<HostResultObject>,
    ) -> Result<(), HostError> {
        let close = status.is_terminal() || hr.is_failure();
        self.send(SinkEvent::Status { status, hr, message, object }, close)
    }
}

/// Receiving half of [`result_channel`]
pub struct ResultStream {
    receiver: mpsc::UnboundedReceiver<SinkEvent>,
}

impl ResultStream {
    /// Next event, `None` once the operation finished
    pub async fn recv(&mut self) -> Option<SinkEvent> {
        self.receiver.recv().await
    }

    /// Drain the stream into a summary of the whole operation
    pub async fn collect_outcome(mut self) -> QueryOutcome {
        let mut outcome = QueryOutcome::default();
        while let Some(event) = self.recv().await {
            match event {
                SinkEvent::Objects(objects) => {
                    outcome.batches += 1;
                    outcome.objects.extend(objects);
                }
                SinkEvent::Status { status, hr, message, object } => {
                    outcome.statuses.push((status, hr, message));
                    if let Some(object) = object {
                        outcome.status_objects.push(object);
                    }
                }
            }
        }
        outcome
    }
}

impl Stream for ResultStream {
    type Item = SinkEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

/// Everything one operation delivered
#[derive(Debug, Default)]
pub struct QueryOutcome {
    pub objects: Vec<HostResultObject>,
    pub batches: usize,
    pub statuses: Vec<(SinkStatus, HResult, Option<String>)>,
    pub status_objects: Vec<HostResultObject>,
}

impl QueryOutcome {
    /// Status of the last event, if any
    pub fn final_status(&self) -> Option<SinkStatus> {
        self.statuses.last().map(|(status, _, _)| *status)
    }
}

/// Create a connected handler/stream pair
pub fn result_channel() -> (std::sync::Arc<ChannelHandler>, ResultStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = ChannelHandler {
        sender: Mutex::new(Some(tx)),
    };
    (std::sync::Arc::new(handler), ResultStream { receiver: rx })
}
