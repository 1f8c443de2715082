use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use oidtrace_types::{Oid, Tid};

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::traits::{ObjectInspector, ObjectStore, Transaction};

#[derive(Default)]
struct Inner {
    objects: HashMap<Oid, Vec<u8>>,
    transactions: Vec<Transaction>,
}

/// In-memory, HashMap-based object store holding bincode-encoded [`Record`]s.
///
/// Intended for tests, embedding, and replaying JSON snapshots. Every
/// [`commit`](Self::commit) appends one transaction whose tid is one larger
/// than the previous.
pub struct InMemoryObjectStore {
    root: Oid,
    inner: RwLock<Inner>,
}

impl InMemoryObjectStore {
    /// Create an empty store whose root object will live at `root`.
    pub fn new(root: Oid) -> Self {
        Self {
            root,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Commit a batch of records as one transaction and return its tid.
    pub fn commit<I>(&self, records: I) -> StoreResult<Tid>
    where
        I: IntoIterator<Item = (Oid, Record)>,
    {
        let encoded = records
            .into_iter()
            .map(|(oid, record)| Ok((oid, record.to_bytes()?)))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(self.commit_raw(encoded))
    }

    /// Commit pre-encoded object data as one transaction.
    ///
    /// The bytes are stored as given, which lets tests plant undecodable records.
    pub fn commit_raw<I>(&self, objects: I) -> Tid
    where
        I: IntoIterator<Item = (Oid, Vec<u8>)>,
    {
        let mut inner = self.inner.write().expect("lock poisoned");
        let tid = Tid::from_u64(
            inner
                .transactions
                .last()
                .map(|t| t.tid.as_u64() + 1)
                .unwrap_or(1),
        );

        let mut seen = HashSet::new();
        let mut oids = Vec::new();
        for (oid, data) in objects {
            if seen.insert(oid) {
                oids.push(oid);
            }
            inner.objects.insert(oid, data);
        }
        inner.transactions.push(Transaction { tid, oids });
        tid
    }

    /// Drop an object without recording a transaction, simulating a record
    /// that vanished from the backing storage. Returns `true` if it existed.
    pub fn remove(&self, oid: &Oid) -> bool {
        self.inner
            .write()
            .expect("lock poisoned")
            .objects
            .remove(oid)
            .is_some()
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").objects.len()
    }

    /// Returns `true` if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").objects.is_empty()
    }

    /// Sorted list of all stored OIDs.
    pub fn all_oids(&self) -> Vec<Oid> {
        let inner = self.inner.read().expect("lock poisoned");
        let mut oids: Vec<Oid> = inner.objects.keys().copied().collect();
        oids.sort();
        oids
    }

    /// Decode the record stored at `oid`.
    pub fn record(&self, oid: &Oid) -> StoreResult<Record> {
        let data = self.load(oid)?;
        Record::from_bytes(&data).map_err(|e| StoreError::CorruptObject {
            oid: *oid,
            reason: e.to_string(),
        })
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn root_oid(&self) -> Oid {
        self.root
    }

    fn load(&self, oid: &Oid) -> StoreResult<Vec<u8>> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .objects
            .get(oid)
            .cloned()
            .ok_or(StoreError::NotFound(*oid))
    }

    fn extract_references(&self, data: &[u8]) -> StoreResult<BTreeSet<Oid>> {
        Ok(Record::from_bytes(data)?.references())
    }

    fn iterate_transactions(&self) -> StoreResult<Vec<Transaction>> {
        Ok(self.inner.read().expect("lock poisoned").transactions.clone())
    }

    fn latest_transaction_id(&self) -> StoreResult<Tid> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner
            .transactions
            .last()
            .map(|t| t.tid)
            .unwrap_or_else(Tid::zero))
    }
}

impl ObjectInspector for InMemoryObjectStore {
    fn describe(&self, oid: &Oid) -> StoreResult<String> {
        Ok(self.record(oid)?.describe(oid))
    }

    fn identifier(&self, oid: &Oid) -> StoreResult<Option<String>> {
        Ok(self.record(oid)?.identifier)
    }

    fn id_attribute(&self, oid: &Oid) -> StoreResult<Option<String>> {
        Ok(self.record(oid)?.id_attribute().map(str::to_string))
    }

    fn attr_name(&self, parent: &Oid, child: &Oid) -> StoreResult<Option<String>> {
        // The child must exist as well: a reference to a vanished object
        // cannot be named.
        self.load(child)?;
        Ok(self.record(parent)?.attr_holding(child).map(str::to_string))
    }

    fn physical_path(&self, oid: &Oid) -> StoreResult<Option<Vec<String>>> {
        Ok(self.record(oid)?.physical_path)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("lock poisoned");
        f.debug_struct("InMemoryObjectStore")
            .field("root", &self.root)
            .field("object_count", &inner.objects.len())
            .field("transaction_count", &inner.transactions.len())
            .finish()
    }
}
