//! Result objects
//!
//! - Records: native class objects owned by the bridge
//! - Arena: handle-keyed storage of records handed to the host
//! - Factory: turns records into host-visible objects

mod arena;
mod factory;
mod record;

pub use arena::RecordArena;
pub use factory::{HostResultObject, ResultObjectFactory, WrapError};
pub use record::{ClassObject, Property, PropertyBag, ResultRecord};
