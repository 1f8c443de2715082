//! JSON snapshots of a store, replayed into an [`InMemoryObjectStore`].
//!
//! ```json
//! {
//!   "root": "0x00",
//!   "transactions": [
//!     { "records": [
//!         { "oid": "0x00", "class": "Root", "attrs": { "site": { "ref": "0x01" } } },
//!         { "oid": "0x01", "class": "Site", "identifier": "site", "physical_path": ["", "site"] }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;

use oidtrace_types::Oid;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryObjectStore;
use crate::record::Record;

/// One object inside a snapshot transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub oid: Oid,
    #[serde(flatten)]
    pub record: Record,
}

/// One transaction of a snapshot, replayed as a single commit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTransaction {
    #[serde(default)]
    pub description: Option<String>,
    pub records: Vec<SnapshotRecord>,
}

/// Full history of a store: root OID plus transactions, oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub root: Oid,
    #[serde(default)]
    pub transactions: Vec<SnapshotTransaction>,
}

impl StoreSnapshot {
    /// Parse a snapshot from JSON text.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        serde_json::from_str(text).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read and parse a snapshot file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Replay every transaction into a fresh in-memory store.
    ///
    /// Fails if the root object is never written, since nothing would be
    /// reachable.
    pub fn into_store(self) -> StoreResult<InMemoryObjectStore> {
        let writes_root = self
            .transactions
            .iter()
            .flat_map(|t| &t.records)
            .any(|r| r.oid == self.root);
        if !writes_root {
            return Err(StoreError::InvalidSnapshot(format!(
                "root object {} is never written",
                self.root
            )));
        }

        let store = InMemoryObjectStore::new(self.root);
        for txn in self.transactions {
            let count = txn.records.len();
            let tid = store.commit(txn.records.into_iter().map(|r| (r.oid, r.record)))?;
            debug!(tid = %tid, records = count, "replayed snapshot transaction");
        }
        Ok(store)
    }
}
