//! Interop error types

use thiserror::Error;

/// Result type for interop operations
pub type Result<T> = std::result::Result<T, ComError>;

/// Errors surfaced by the interop layer
///
/// Failures are never retried; each one reports the server's state at the
/// call that produced it.
#[derive(Error, Debug)]
pub enum ComError {
    /// The remote object no longer exists on the server
    #[error("object disconnected: {0}")]
    DisconnectedObject(String),

    /// The collection changed or the enumeration protocol was violated
    #[error("enumeration invalidated: {0}")]
    EnumerationInvalidated(String),

    /// A dynamically typed attribute value could not be coerced
    #[error("attribute type mismatch: expected {expected}, found {found}")]
    AttributeTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The server does not know the requested member
    #[error("unknown member: {0}")]
    UnknownMember(String),

    /// Any other failed server call
    #[error("{context} failed with HRESULT 0x{hresult:08x}")]
    Server { hresult: u32, context: String },

    /// Native module or one of its exports could not be loaded
    #[error("native module error: {0}")]
    NativeModule(String),

    /// Operation not available on this platform or backend
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl ComError {
    /// Map a failed HRESULT to the matching error kind
    pub fn from_hresult(code: u32, context: impl Into<String>) -> Self {
        let context = context.into();
        match code {
            hresult::CO_E_OBJNOTCONNECTED
            | hresult::RPC_E_DISCONNECTED
            | hresult::RPC_E_SERVER_DIED
            | hresult::RPC_E_SERVER_DIED_DNE => Self::DisconnectedObject(context),
            hresult::E_CHANGED_STATE => Self::EnumerationInvalidated(context),
            hresult::DISP_E_UNKNOWNNAME | hresult::DISP_E_MEMBERNOTFOUND => {
                Self::UnknownMember(context)
            }
            _ => Self::Server {
                hresult: code,
                context,
            },
        }
    }

    /// Whether the error means the remote object is gone
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::DisconnectedObject(_))
    }
}

/// HRESULT codes the automation boundary reports
pub mod hresult {
    /// Operation successful
    pub const S_OK: u32 = 0x00000000;
    /// Operation successful, returning false (end of enumeration)
    pub const S_FALSE: u32 = 0x00000001;
    /// Unspecified error
    pub const E_FAIL: u32 = 0x80004005;
    /// Invalid pointer
    pub const E_POINTER: u32 = 0x80004003;
    /// No such interface supported
    pub const E_NOINTERFACE: u32 = 0x80004002;
    /// Invalid argument
    pub const E_INVALIDARG: u32 = 0x80070057;
    /// Object state changed underneath the caller
    pub const E_CHANGED_STATE: u32 = 0x8000000C;
    /// Object or server not available
    pub const CO_E_OBJNOTCONNECTED: u32 = 0x800401FD;
    /// Object invoked has disconnected from its clients
    pub const RPC_E_DISCONNECTED: u32 = 0x80010108;
    /// Server died
    pub const RPC_E_SERVER_DIED: u32 = 0x80010007;
    /// Server died before the call was executed
    pub const RPC_E_SERVER_DIED_DNE: u32 = 0x80010012;
    /// Member not found
    pub const DISP_E_MEMBERNOTFOUND: u32 = 0x80020003;
    /// Type mismatch
    pub const DISP_E_TYPEMISMATCH: u32 = 0x80020005;
    /// Unknown name
    pub const DISP_E_UNKNOWNNAME: u32 = 0x80020006;
}
