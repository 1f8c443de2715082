//! Object store adapter interface for oidtrace.
//!
//! The analysis crates never talk to a concrete database. They consume two
//! traits:
//!
//! - [`ObjectStore`] -- raw records, reference extraction, and the
//!   transaction log
//! - [`ObjectInspector`] -- identity, attribute names, and physical paths of
//!   live objects
//!
//! # Bundled Backends
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store of bincode-encoded
//!   [`Record`]s, implementing both traits
//! - [`StoreSnapshot`] -- JSON history replayed into an in-memory store
//! - [`BlobDirectory`] -- enumerates blob files and maps them back to OIDs
//!
//! # Design Rules
//!
//! 1. Adapters are read-only from the analysis side.
//! 2. Reference extraction is a pure function of the raw record bytes.
//! 3. Transactions are reported oldest first.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod blobs;
pub mod error;
pub mod memory;
pub mod record;
pub mod snapshot;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use blobs::{fingerprint, BlobDirectory, BlobFingerprint};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use record::{Record, Value};
pub use snapshot::{SnapshotRecord, SnapshotTransaction, StoreSnapshot};
pub use traits::{ObjectInspector, ObjectStore, Transaction};
