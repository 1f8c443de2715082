use std::path::PathBuf;

use oidtrace_types::Oid;

/// Errors from object store adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(Oid),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {oid}: {reason}")]
    CorruptObject { oid: Oid, reason: String },

    /// A store snapshot document is structurally invalid.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A path inside the blob directory does not follow the blob layout.
    #[error("not a blob path: {}", .0.display())]
    InvalidBlobPath(PathBuf),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
