//! Host-side result handlers
//!
//! A handler is what the host supplied when it issued an asynchronous
//! request. Its identity (the `Arc` it was registered with) is also the key
//! used to cancel that request.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use crate::objects::HostResultObject;
use crate::types::{flags, HResult};
use super::runtime::HostError;

/// Named status passed to [`ResultHandler::status`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SinkStatus {
    Unknown,
    Complete,
    Error,
    Progress,
    Requirements,
}

impl SinkStatus {
    /// Classify a `SetStatus` call
    pub fn from_flags(status_flags: i32, hr: HResult) -> Self {
        match status_flags {
            flags::WBEM_STATUS_COMPLETE if hr.is_success() => SinkStatus::Complete,
            flags::WBEM_STATUS_COMPLETE => SinkStatus::Error,
            flags::WBEM_STATUS_PROGRESS => SinkStatus::Progress,
            flags::WBEM_STATUS_REQUIREMENTS => SinkStatus::Requirements,
            _ => SinkStatus::Unknown,
        }
    }

    /// Constant name on the host side
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkStatus::Unknown => "unknown",
            SinkStatus::Complete => "complete",
            SinkStatus::Error => "error",
            SinkStatus::Progress => "progress",
            SinkStatus::Requirements => "requirements",
        }
    }

    /// Whether this status ends the operation
    pub fn is_terminal(&self) -> bool {
        matches!(self, SinkStatus::Complete | SinkStatus::Error)
    }
}

impl fmt::Display for SinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host callback receiving the results of one asynchronous operation
///
/// Both methods are called from provider threads that have been attached to
/// the host runtime. Returning `Err` models a host exception: the bridge
/// logs and clears it.
pub trait ResultHandler: Send + Sync {
    /// A batch of result objects
    fn deliver(&self, objects: Vec<HostResultObject>) -> Result<(), HostError>;

    /// Progress or terminal status
    fn status(
        &self,
        status: SinkStatus,
        hr: HResult,
        message: Option<String>,
        object: Option<HostResultObject>,
    ) -> Result<(), HostError>;
}

/// Shared reference to a host handler
pub type HandlerRef = Arc<dyn ResultHandler>;

/// Reference identity of a handler
pub(crate) fn handler_key(handler: &HandlerRef) -> usize {
    Arc::as_ptr(handler) as *const () as usize
}

/// Run host code, turning a panic into a `HostError`
pub(crate) fn guard_host_call<F>(call: F) -> Result<(), HostError>
where
    F: FnOnce() -> Result<(), HostError>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(HostError::Panicked(message))
        }
    }
}
