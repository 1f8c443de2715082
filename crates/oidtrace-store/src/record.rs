use std::collections::{BTreeMap, BTreeSet};

use oidtrace_types::Oid;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A single attribute value inside a [`Record`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Text(String),
    Int(i64),
    /// Direct reference to another stored object.
    Ref(Oid),
    List(Vec<Value>),
}

impl Value {
    fn collect_references(&self, out: &mut BTreeSet<Oid>) {
        match self {
            Self::Ref(oid) => {
                out.insert(*oid);
            }
            Self::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Self::Text(_) | Self::Int(_) => {}
        }
    }
}

/// Structured form of one stored object, as kept by the bundled backends.
///
/// Attributes are kept in a sorted map so that "first attribute holding a
/// reference" is well defined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub class: String,
    /// What the object's identifier method returns, when it has one.
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub physical_path: Option<Vec<String>>,
    #[serde(default)]
    pub attrs: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            identifier: None,
            physical_path: None,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Set the physical path from its `/`-separated form (`/site/folder`).
    pub fn with_path(mut self, path: &str) -> Self {
        self.physical_path = Some(path.split('/').map(str::to_string).collect());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    pub fn with_ref(self, name: impl Into<String>, target: Oid) -> Self {
        self.with_attr(name, Value::Ref(target))
    }

    /// Every OID referenced anywhere in the attribute values.
    pub fn references(&self) -> BTreeSet<Oid> {
        let mut out = BTreeSet::new();
        for value in self.attrs.values() {
            value.collect_references(&mut out);
        }
        out
    }

    /// First attribute (in name order) whose value is exactly `Ref(child)`.
    ///
    /// References nested in lists are not attributes of their own and do
    /// not count.
    pub fn attr_holding(&self, child: &Oid) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(_, value)| matches!(value, Value::Ref(oid) if oid == child))
            .map(|(name, _)| name.as_str())
    }

    /// The generic `id` attribute, when it is text.
    pub fn id_attribute(&self) -> Option<&str> {
        match self.attrs.get("id") {
            Some(Value::Text(id)) => Some(id),
            _ => None,
        }
    }

    /// String form: `<Class at /physical/path>`, or `<Class oid=0x..>` when
    /// the object has no physical path.
    pub fn describe(&self, oid: &Oid) -> String {
        match &self.physical_path {
            Some(path) => format!("<{} at {}>", self.class, path.join("/")),
            None => format!("<{} oid={}>", self.class, oid.repr()),
        }
    }

    pub fn to_bytes(&self) -> StoreResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn from_bytes(data: &[u8]) -> StoreResult<Self> {
        bincode::deserialize(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
