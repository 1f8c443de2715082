//! Memoized per-OID lookups over an [`ObjectInspector`].
//!
//! Every lookup is computed once per OID (or OID pair) and kept for the rest
//! of the session. Failures never escape: presentation fields degrade to an
//! error marker or `None`, identity fields degrade to `None`.

use std::collections::HashMap;
use std::sync::Arc;

use oidtrace_store::ObjectInspector;
use oidtrace_types::Oid;
use tracing::debug;

/// String form reported for objects that cannot be described.
pub const ERROR_MARKER: &str = "<error>";

/// Identifier reported for the root object.
pub const ROOT_ID: &str = "Root";

/// Session-owned lookup caches over an object inspector.
pub struct Inspector {
    backend: Arc<dyn ObjectInspector>,
    root: Oid,
    describe_limit: usize,
    strings: HashMap<Oid, String>,
    ids: HashMap<Oid, Option<String>>,
    attr_names: HashMap<(Oid, Oid), Option<String>>,
    physical_paths: HashMap<Oid, Option<Vec<String>>>,
}

impl Inspector {
    pub fn new(backend: Arc<dyn ObjectInspector>, root: Oid, describe_limit: usize) -> Self {
        Self {
            backend,
            root,
            describe_limit,
            strings: HashMap::new(),
            ids: HashMap::new(),
            attr_names: HashMap::new(),
            physical_paths: HashMap::new(),
        }
    }

    /// String form of the object, cut to the configured number of characters.
    pub fn describe(&mut self, oid: &Oid) -> String {
        if let Some(s) = self.strings.get(oid) {
            return s.clone();
        }
        let s = match self.backend.describe(oid) {
            Ok(full) => full.chars().take(self.describe_limit).collect(),
            Err(e) => {
                debug!(oid = %oid, error = %e, "cannot describe object");
                ERROR_MARKER.to_string()
            }
        };
        self.strings.insert(*oid, s.clone());
        s
    }

    /// Identifier of the object.
    ///
    /// The root is always `Root`. Otherwise the identifier method wins; only
    /// when it is missing or fails is the generic `id` attribute used. An
    /// empty identifier counts as none.
    pub fn identifier(&mut self, oid: &Oid) -> Option<String> {
        if let Some(id) = self.ids.get(oid) {
            return id.clone();
        }
        let id = self.lookup_identifier(oid);
        self.ids.insert(*oid, id.clone());
        id
    }

    fn lookup_identifier(&self, oid: &Oid) -> Option<String> {
        if *oid == self.root {
            return Some(ROOT_ID.to_string());
        }
        match self.backend.identifier(oid) {
            Ok(Some(id)) => return Some(id).filter(|id| !id.is_empty()),
            Ok(None) => {}
            Err(e) => debug!(oid = %oid, error = %e, "identifier lookup failed"),
        }
        match self.backend.id_attribute(oid) {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                debug!(oid = %oid, error = %e, "id attribute lookup failed");
                None
            }
        }
    }

    /// Name of the attribute under which `parent` holds `child`.
    pub fn attr_name(&mut self, child: &Oid, parent: &Oid) -> Option<String> {
        let key = (*child, *parent);
        if let Some(name) = self.attr_names.get(&key) {
            return name.clone();
        }
        let name = self.backend.attr_name(parent, child).unwrap_or_else(|e| {
            debug!(child = %child, parent = %parent, error = %e, "attribute name lookup failed");
            None
        });
        self.attr_names.insert(key, name.clone());
        name
    }

    /// Identifier of `oid`, else the attribute name under which `parent`
    /// holds it.
    pub fn id_or_attr_name(&mut self, oid: &Oid, parent: Option<&Oid>) -> Option<String> {
        self.identifier(oid)
            .or_else(|| parent.and_then(|parent| self.attr_name(oid, parent)))
    }

    /// Physical container path of the object.
    pub fn physical_path(&mut self, oid: &Oid) -> Option<Vec<String>> {
        if let Some(path) = self.physical_paths.get(oid) {
            return path.clone();
        }
        let path = self.backend.physical_path(oid).unwrap_or_else(|e| {
            debug!(oid = %oid, error = %e, "physical path lookup failed");
            None
        });
        self.physical_paths.insert(*oid, path.clone());
        path
    }
}

impl std::fmt::Debug for Inspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inspector")
            .field("root", &self.root)
            .field("describe_limit", &self.describe_limit)
            .field("cached_ids", &self.ids.len())
            .field("cached_attr_names", &self.attr_names.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oidtrace_store::{InMemoryObjectStore, Record, Value};

    fn oid(n: u64) -> Oid {
        Oid::from_u64(n)
    }

    fn setup() -> (Arc<InMemoryObjectStore>, Inspector) {
        let store = Arc::new(InMemoryObjectStore::new(oid(0)));
        store
            .commit([
                (oid(0), Record::new("Application").with_identifier("app").with_ref("site", oid(1))),
                (
                    oid(1),
                    Record::new("PloneSite")
                        .with_identifier("site")
                        .with_path("/site")
                        .with_ref("doc", oid(2)),
                ),
                (
                    oid(2),
                    Record::new("DocumentWithAVeryLongClassNameIndeed")
                        .with_identifier("")
                        .with_attr("id", Value::Text("doc".into()))
                        .with_path("/site/doc"),
                ),
                (oid(3), Record::new("Bucket")),
                (oid(4), Record::new("Page").with_attr("id", Value::Text("page".into()))),
            ])
            .unwrap();
        let inspector = Inspector::new(store.clone(), oid(0), 20);
        (store, inspector)
    }

    #[test]
    fn root_is_named_root() {
        let (_, mut inspector) = setup();
        assert_eq!(inspector.identifier(&oid(0)).as_deref(), Some(ROOT_ID));
    }

    #[test]
    fn identifier_falls_back_to_id_attribute() {
        let (_, mut inspector) = setup();
        assert_eq!(inspector.identifier(&oid(1)).as_deref(), Some("site"));
        assert_eq!(inspector.identifier(&oid(4)).as_deref(), Some("page"));
        assert_eq!(inspector.identifier(&oid(3)), None);
    }

    #[test]
    fn empty_identifier_hides_id_attribute() {
        let (_, mut inspector) = setup();
        assert_eq!(inspector.identifier(&oid(2)), None);
    }

    #[test]
    fn describe_is_bounded_and_degrades() {
        let (_, mut inspector) = setup();
        assert_eq!(inspector.describe(&oid(2)).chars().count(), 20);
        assert_eq!(inspector.describe(&oid(99)), ERROR_MARKER);
    }

    #[test]
    fn lookups_are_memoized() {
        let (store, mut inspector) = setup();
        let first = inspector.describe(&oid(1));
        let path = inspector.physical_path(&oid(1));
        let name = inspector.attr_name(&oid(2), &oid(1));
        store.remove(&oid(1));
        store.remove(&oid(2));
        assert_eq!(inspector.describe(&oid(1)), first);
        assert_eq!(inspector.physical_path(&oid(1)), path);
        assert_eq!(inspector.attr_name(&oid(2), &oid(1)), name);
        assert_eq!(name.as_deref(), Some("doc"));
    }

    #[test]
    fn missing_objects_degrade_to_none() {
        let (_, mut inspector) = setup();
        assert_eq!(inspector.physical_path(&oid(99)), None);
        assert_eq!(inspector.identifier(&oid(99)), None);
        assert_eq!(inspector.attr_name(&oid(99), &oid(1)), None);
    }

    #[test]
    fn id_or_attr_name_prefers_identifier() {
        let (_, mut inspector) = setup();
        assert_eq!(inspector.id_or_attr_name(&oid(1), Some(&oid(0))).as_deref(), Some("site"));
        assert_eq!(inspector.id_or_attr_name(&oid(3), None), None);
    }
}
