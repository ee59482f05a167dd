//! Asynchronous result sinks
//!
//! - Object sink: the native callback object handed to the provider
//! - Registry: sinks whose requests are still in flight
//! - State: sink lifecycle

mod object_sink;
mod registry;
mod state;

pub use object_sink::{AsyncResultSink, WbemObjectSink};
pub use registry::SinkRegistry;
pub use state::SinkState;
