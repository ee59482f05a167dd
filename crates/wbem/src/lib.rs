//! WBEM asynchronous result bridge
//!
//! This crate carries the results of asynchronous WBEM (WMI) requests from a
//! native provider into a host runtime: it batches result records, converts
//! their VARIANT properties into host values and reports completion.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Host (handlers, result streams)             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session              │  Result objects   │  Marshalling    │
//! │  - query / enumerate  │  - record arena   │  - VARIANT      │
//! │  - cancel             │  - handles        │  - SAFEARRAY    │
//! │  - namespaces         │                   │  - dates        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Async result sinks (batching, status, registry)            │
//! │  Runtime bridge (thread attachment, object allocation)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 Native provider (IWbemServices)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **Sink**: per-request callback object the provider pushes results into
//! - **Handler**: host callback that receives batches and the final status
//! - **Attachment**: a provider thread must be attached to the host runtime
//!   while it calls into the host; [`RuntimeBridge::attach`] scopes that
//! - **Handle**: host objects refer to their native record by
//!   [`ObjectHandle`], released exactly once
//!
//! # Modules
//!
//! - [`types`]: identifiers, VARIANT model, errors and result codes
//! - [`marshal`]: VARIANT to host value conversion
//! - [`host`]: host runtime, value model and handler traits
//! - [`objects`]: result records and host result objects
//! - [`sink`]: asynchronous result sinks and their registry
//! - [`service`]: provider session

pub mod types;
pub mod marshal;
pub mod host;
pub mod objects;
pub mod sink;
pub mod service;

mod bridge;

pub use types::{
    flags, hresult,
    WbemError, Result, HResult,
    ObjectHandle, SinkId, HostObjectRef,
    Variant, VarType, CimType, SafeArray, SafeArrayData,
};
pub use bridge::{BridgeConfig, RuntimeBridge, DEFAULT_BATCH_THRESHOLD};
pub use host::{
    result_channel, HandlerRef, HostError, HostRuntime, HostType, HostValue,
    LocalRuntime, QueryOutcome, ResultHandler, ResultStream, SinkEvent, SinkStatus,
};
pub use objects::{ClassObject, HostResultObject, Property, PropertyBag, ResultRecord};
pub use service::{Provider, WbemService};
pub use sink::{AsyncResultSink, SinkRegistry, SinkState, WbemObjectSink};
