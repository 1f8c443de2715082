//! Error types for reference graph analysis.

use oidtrace_store::StoreError;
use oidtrace_types::{Oid, TypeError};

/// Errors that can occur while building or querying the reference graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// A map-dependent query ran before [`build`](crate::GraphSession::build) succeeded.
    #[error("reference maps are not built; call build() first")]
    NotBuilt,

    /// `build` was called on a session that already holds reference maps.
    #[error("reference maps are already built")]
    AlreadyBuilt,

    /// Loading or decoding an object failed during the graph walk.
    #[error("failed to read object {oid} while walking the store: {source}")]
    StoreRead {
        /// The object whose record could not be read.
        oid: Oid,
        #[source]
        source: StoreError,
    },

    /// A line of the reference cache file could not be parsed.
    #[error("corrupt reference cache at line {line}: {reason}")]
    CacheCorrupt {
        /// 1-based line number.
        line: usize,
        reason: String,
    },

    /// Reading or writing the reference cache file failed.
    #[error("reference cache I/O error: {0}")]
    CacheIo(#[from] std::io::Error),

    /// A store call outside the graph walk failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Caller input could not be turned into an OID.
    #[error("invalid OID: {0}")]
    InvalidOid(#[from] TypeError),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
