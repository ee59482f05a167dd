//! Bridge error types and provider result codes

use std::fmt;
use thiserror::Error;
use crate::host::HostError;
use super::identifiers::ObjectHandle;
use super::variant::VarType;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, WbemError>;

/// Bridge errors
#[derive(Error, Debug)]
pub enum WbemError {
    /// Variant type (or array element type) has no host mapping
    #[error("{detail}: {vt}")]
    UnsupportedType { vt: VarType, detail: &'static str },

    /// A provider call returned a failure code
    #[error("{context}: {} ({hr})", .hr.message())]
    NativeCall { context: String, hr: HResult },

    /// Bad argument supplied by the caller
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The service has no live provider connection
    #[error("WMI service is not initialized")]
    NotConnected,

    /// No in-flight operation is registered for the given handler
    #[error("could not find internal sink for specified handler")]
    SinkNotFound,

    /// The host object was already disposed
    #[error("object already released: handle {0}")]
    ObjectReleased(ObjectHandle),

    /// The record has no property with this name
    #[error("property not found: {0}")]
    PropertyNotFound(String),

    /// Array storage shorter than its bounds require
    #[error("buffer underflow: need {needed} bytes, have {have}")]
    BufferUnderflow { needed: usize, have: usize },

    /// Array storage holds a different element count than its bounds
    #[error("array size mismatch: expected {expected}, got {got}")]
    ArraySizeMismatch { expected: usize, got: usize },

    /// Host runtime failure
    #[error("host runtime error: {0}")]
    Host(#[from] HostError),
}

impl WbemError {
    /// Build an `UnsupportedType` for a scalar tag
    pub fn unsupported(vt: VarType) -> Self {
        WbemError::UnsupportedType { vt, detail: "unsupported variant type" }
    }

    /// Build an `UnsupportedType` for an array element tag
    pub fn unsupported_array(vt: VarType) -> Self {
        WbemError::UnsupportedType { vt, detail: "array of this type not supported" }
    }

    /// Build a `NativeCall` error
    pub fn native(context: impl Into<String>, hr: HResult) -> Self {
        WbemError::NativeCall { context: context.into(), hr }
    }
}

/// A 32-bit COM/WBEM result code
///
/// Negative values are failures, zero and positive values are successes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HResult(pub i32);

impl HResult {
    /// Reinterpret an unsigned code (as written in headers) as an HRESULT
    pub const fn from_u32(code: u32) -> Self {
        Self(code as i32)
    }

    /// Signed value, as passed to host status callbacks
    pub fn code(self) -> i32 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    pub fn is_failure(self) -> bool {
        self.0 < 0
    }

    /// Convert to `Ok(())` or the failing code
    pub fn ok(self) -> std::result::Result<(), HResult> {
        if self.is_success() { Ok(()) } else { Err(self) }
    }

    /// Human-readable provider message
    pub fn message(self) -> &'static str {
        hresult::describe(self)
    }

    /// Diagnostic text passed to host status callbacks on failure
    pub fn diagnostic(self) -> String {
        format!("{} ({})", self.message(), self)
    }
}

impl fmt::Debug for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HResult(0x{:08X})", self.0 as u32)
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0 as u32)
    }
}

/// HRESULT codes returned by COM and the WBEM provider
pub mod hresult {
    use super::HResult;

    /// Operation successful
    pub const S_OK: HResult = HResult(0);
    /// Operation successful, returning false
    pub const S_FALSE: HResult = HResult(1);
    /// Unspecified error
    pub const E_FAIL: HResult = HResult::from_u32(0x80004005);
    /// Not implemented
    pub const E_NOTIMPL: HResult = HResult::from_u32(0x80004001);
    /// Invalid pointer
    pub const E_POINTER: HResult = HResult::from_u32(0x80004003);
    /// Out of memory
    pub const E_OUTOFMEMORY: HResult = HResult::from_u32(0x8007000E);
    /// Invalid argument
    pub const E_INVALIDARG: HResult = HResult::from_u32(0x80070057);
    /// Access denied
    pub const E_ACCESSDENIED: HResult = HResult::from_u32(0x80070005);
    /// Security already initialized
    pub const RPC_E_TOO_LATE: HResult = HResult::from_u32(0x80010119);
    /// RPC server unavailable
    pub const RPC_S_SERVER_UNAVAILABLE: HResult = HResult::from_u32(0x800706BA);

    pub const WBEM_S_NO_ERROR: HResult = HResult(0);
    pub const WBEM_S_FALSE: HResult = HResult(1);
    pub const WBEM_S_NO_MORE_DATA: HResult = HResult(0x40005);
    pub const WBEM_E_FAILED: HResult = HResult::from_u32(0x80041001);
    pub const WBEM_E_NOT_FOUND: HResult = HResult::from_u32(0x80041002);
    pub const WBEM_E_ACCESS_DENIED: HResult = HResult::from_u32(0x80041003);
    pub const WBEM_E_PROVIDER_FAILURE: HResult = HResult::from_u32(0x80041004);
    pub const WBEM_E_TYPE_MISMATCH: HResult = HResult::from_u32(0x80041005);
    pub const WBEM_E_OUT_OF_MEMORY: HResult = HResult::from_u32(0x80041006);
    pub const WBEM_E_INVALID_PARAMETER: HResult = HResult::from_u32(0x80041008);
    pub const WBEM_E_NOT_AVAILABLE: HResult = HResult::from_u32(0x80041009);
    pub const WBEM_E_NOT_SUPPORTED: HResult = HResult::from_u32(0x8004100C);
    pub const WBEM_E_INVALID_NAMESPACE: HResult = HResult::from_u32(0x8004100E);
    pub const WBEM_E_INVALID_CLASS: HResult = HResult::from_u32(0x80041010);
    pub const WBEM_E_INVALID_QUERY: HResult = HResult::from_u32(0x80041017);
    pub const WBEM_E_INVALID_QUERY_TYPE: HResult = HResult::from_u32(0x80041018);
    pub const WBEM_E_CALL_CANCELLED: HResult = HResult::from_u32(0x80041032);
    pub const WBEM_E_SHUTTING_DOWN: HResult = HResult::from_u32(0x80041033);
    pub const WBEM_E_QUOTA_VIOLATION: HResult = HResult::from_u32(0x8004106C);

    /// Message text for a result code
    pub fn describe(hr: HResult) -> &'static str {
        match hr {
            S_OK => "The operation completed successfully",
            S_FALSE => "The operation completed with a false result",
            WBEM_S_NO_MORE_DATA => "No more data is available",
            E_FAIL => "Unspecified error",
            E_NOTIMPL => "Not implemented",
            E_POINTER => "Invalid pointer",
            E_OUTOFMEMORY => "Not enough memory resources are available to complete this operation",
            E_INVALIDARG => "The parameter is incorrect",
            E_ACCESSDENIED => "Access is denied",
            RPC_E_TOO_LATE => "Security must be initialized before any interfaces are marshalled or unmarshalled",
            RPC_S_SERVER_UNAVAILABLE => "The RPC server is unavailable",
            WBEM_E_FAILED => "Generic failure",
            WBEM_E_NOT_FOUND => "Not found",
            WBEM_E_ACCESS_DENIED => "Access denied",
            WBEM_E_PROVIDER_FAILURE => "Provider failure",
            WBEM_E_TYPE_MISMATCH => "Type mismatch",
            WBEM_E_OUT_OF_MEMORY => "Out of memory",
            WBEM_E_INVALID_PARAMETER => "Invalid parameter",
            WBEM_E_NOT_AVAILABLE => "Not available",
            WBEM_E_NOT_SUPPORTED => "Not supported",
            WBEM_E_INVALID_NAMESPACE => "Invalid namespace",
            WBEM_E_INVALID_CLASS => "Invalid class",
            WBEM_E_INVALID_QUERY => "Invalid query",
            WBEM_E_INVALID_QUERY_TYPE => "Invalid query type",
            WBEM_E_CALL_CANCELLED => "Call cancelled",
            WBEM_E_SHUTTING_DOWN => "Shutting down",
            WBEM_E_QUOTA_VIOLATION => "Quota violation",
            _ => "Unknown error",
        }
    }
}
