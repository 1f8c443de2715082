use std::collections::BTreeSet;

use oidtrace_types::{Oid, Tid};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// One committed transaction: its id and the OIDs it modified, in record order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub tid: Tid,
    pub oids: Vec<Oid>,
}

/// Read access to a persistent object store.
///
/// The analysis never writes through this trait. Implementations must satisfy:
/// - `load` returns the raw serialized record of one object, or
///   [`StoreError::NotFound`](crate::StoreError::NotFound).
/// - `extract_references` is a pure function of the bytes it is given.
/// - `iterate_transactions` yields transactions oldest first.
/// - `latest_transaction_id` changes whenever anything is committed.
pub trait ObjectStore: Send + Sync {
    /// OID of the distinguished root object.
    fn root_oid(&self) -> Oid;

    /// Raw serialized record of `oid`.
    fn load(&self, oid: &Oid) -> StoreResult<Vec<u8>>;

    /// Every OID referenced from a raw record.
    fn extract_references(&self, data: &[u8]) -> StoreResult<BTreeSet<Oid>>;

    /// All transactions, oldest first.
    fn iterate_transactions(&self) -> StoreResult<Vec<Transaction>>;

    /// Id of the most recent transaction.
    fn latest_transaction_id(&self) -> StoreResult<Tid>;

    /// Load `oid` and extract its references in one step.
    fn references_of(&self, oid: &Oid) -> StoreResult<BTreeSet<Oid>> {
        let data = self.load(oid)?;
        self.extract_references(&data)
    }
}

/// Live inspection of stored objects: identity, attribute names, and location.
///
/// Every method may fail with `NotFound` when the object vanished; callers
/// that only need the value for display degrade such failures themselves.
pub trait ObjectInspector: Send + Sync {
    /// Human-readable string form of the object (unbounded).
    fn describe(&self, oid: &Oid) -> StoreResult<String>;

    /// Result of the object's identifier method, if it has one.
    fn identifier(&self, oid: &Oid) -> StoreResult<Option<String>>;

    /// Value of the object's generic `id` attribute, if it has one.
    fn id_attribute(&self, oid: &Oid) -> StoreResult<Option<String>>;

    /// Name of the first attribute of `parent` (in sorted name order) whose
    /// value is a direct reference to `child`.
    fn attr_name(&self, parent: &Oid, child: &Oid) -> StoreResult<Option<String>>;

    /// Physical container path of the object, if it lives in a container hierarchy.
    fn physical_path(&self, oid: &Oid) -> StoreResult<Option<Vec<String>>>;
}
