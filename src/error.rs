//! Error types for kompas-unhide

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// HRESULT the host reports when a reference was already invalidated
/// (`RPC_E_INVALID_OBJECT`, "the requested object does not exist").
pub const HRESULT_OBJECT_GONE: u32 = 0x8001_0114;

/// HRESULT for a proxy whose server has gone away (`RPC_E_DISCONNECTED`).
pub const HRESULT_DISCONNECTED: u32 = 0x8001_0108;

/// Failure reported by a call into the CAD host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host does not expose this method, property or category.
    #[error("not supported by the host: {0}")]
    Unsupported(String),

    /// The referenced host object no longer exists.
    #[error("host object no longer exists")]
    ObjectGone,

    /// The capability exists but the call failed.
    #[error("host error 0x{code:08X}: {message}")]
    Call { code: u32, message: String },
}

impl HostError {
    /// Build a [`HostError::Call`] from a raw HRESULT, mapping the
    /// "object gone" codes to [`HostError::ObjectGone`].
    pub fn from_code(code: u32, message: impl Into<String>) -> Self {
        match code {
            HRESULT_OBJECT_GONE | HRESULT_DISCONNECTED => HostError::ObjectGone,
            _ => HostError::Call {
                code,
                message: message.into(),
            },
        }
    }

    /// Generic failure without a host code.
    pub fn failed(message: impl Into<String>) -> Self {
        HostError::Call {
            code: 0,
            message: message.into(),
        }
    }

    /// Build a [`HostError::Unsupported`] for a missing capability.
    pub fn unsupported(what: impl Into<String>) -> Self {
        HostError::Unsupported(what.into())
    }

    /// Whether the host object was already released.
    pub fn is_object_gone(&self) -> bool {
        matches!(self, HostError::ObjectGone)
    }

    /// Whether the capability is absent rather than failing.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, HostError::Unsupported(_))
    }

    /// The host error code, if the host reported one.
    pub fn code(&self) -> Option<u32> {
        match self {
            HostError::Call { code, .. } if *code != 0 => Some(*code),
            HostError::ObjectGone => Some(HRESULT_OBJECT_GONE),
            _ => None,
        }
    }
}

/// Result type for calls into the CAD host
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Main error type for kompas-unhide operations
#[derive(Debug, Error)]
pub enum UnhideError {
    /// IO error occurred while walking the model directory
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Root folder is missing or not a directory
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// The CAD application could not be started
    #[error("Failed to start CAD application {prog_id}: {source}")]
    SessionStart {
        prog_id: String,
        #[source]
        source: HostError,
    },

    /// The document could not be opened
    #[error("Failed to open document: {0}")]
    DocumentOpen(#[source] HostError),

    /// The document has no top-level part
    #[error("Top part not available")]
    PartMissing,

    /// Any other host failure while processing a document
    #[error(transparent)]
    Host(#[from] HostError),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),
}

impl UnhideError {
    /// The host error code behind this error, if any.
    pub fn host_code(&self) -> Option<u32> {
        match self {
            UnhideError::SessionStart { source, .. } => source.code(),
            UnhideError::DocumentOpen(source) | UnhideError::Host(source) => source.code(),
            _ => None,
        }
    }
}

/// Result type alias for kompas-unhide operations
pub type Result<T> = std::result::Result<T, UnhideError>;

impl From<String> for UnhideError {
    fn from(s: String) -> Self {
        UnhideError::Custom(s)
    }
}

impl From<&str> for UnhideError {
    fn from(s: &str) -> Self {
        UnhideError::Custom(s.to_string())
    }
}
