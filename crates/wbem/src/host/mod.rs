//! Host side of the bridge
//!
//! - Value model: what marshalled values look like to the host
//! - Runtime: thread attachment and object allocation
//! - Handlers: the callbacks an asynchronous request reports to

mod attachment;
mod channel;
mod handler;
mod runtime;
mod value;

pub use attachment::{AttachGuard, ThreadAttachments};
pub use channel::{result_channel, ChannelHandler, QueryOutcome, ResultStream, SinkEvent};
pub use handler::{HandlerRef, ResultHandler, SinkStatus};
pub(crate) use handler::{guard_host_call, handler_key};
pub use runtime::{HostError, HostRuntime, LocalRuntime};
pub use value::{HostType, HostValue};
