//! Core bridge types
//!
//! This module contains the data structures shared by every layer:
//! - Identifiers: object handles, sink IDs, host object references
//! - Native values: VARIANT, SAFEARRAY, CIMTYPE
//! - Result codes and errors

mod error;
mod identifiers;
mod variant;

pub use error::*;
pub use identifiers::{HostObjectRef, ObjectHandle, SinkId};
pub use variant::*;

/// Request and status flag values of the WBEM API
pub mod flags {
    /// Return from the call immediately (semi-synchronous)
    pub const WBEM_FLAG_RETURN_IMMEDIATELY: i32 = 0x10;
    /// Forward-only enumerator
    pub const WBEM_FLAG_FORWARD_ONLY: i32 = 0x20;
    /// Send intermediate status through the sink
    pub const WBEM_FLAG_SEND_STATUS: i32 = 0x80;
    /// Bypass the provider cache and read straight from the provider
    pub const WBEM_FLAG_DIRECT_READ: i32 = 0x200;
    /// Return localized qualifiers
    pub const WBEM_FLAG_USE_AMENDED_QUALIFIERS: i32 = 0x20000;
    /// Enumerate the whole subclass tree
    pub const WBEM_FLAG_DEEP: i32 = 0;
    /// Enumerate immediate subclasses only
    pub const WBEM_FLAG_SHALLOW: i32 = 1;

    /// SetStatus: the operation finished
    pub const WBEM_STATUS_COMPLETE: i32 = 0;
    /// SetStatus: the provider needs something from the client
    pub const WBEM_STATUS_REQUIREMENTS: i32 = 1;
    /// SetStatus: progress report
    pub const WBEM_STATUS_PROGRESS: i32 = 2;
}

/// Query language passed to the provider
pub const QUERY_LANGUAGE_WQL: &str = "WQL";
