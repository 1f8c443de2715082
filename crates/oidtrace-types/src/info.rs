//! Presentation records for queried objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::oid::Oid;

/// Chain of OIDs starting at the queried object and following the chosen
/// back-reference at each step.
pub type OidPath = Vec<Oid>;

/// [`OidPath`] with each element replaced by a human label (identifier or
/// attribute name), or `None` when neither resolves.
pub type IdPath = Vec<Option<String>>;

/// Placeholder printed for absent fields.
const ABSENT: &str = "None";

/// Snapshot of what is known about one OID, built per query.
///
/// Holds only strings and sequences of plain values. `obj` is the bounded
/// string form of the object, not the object itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidInfo {
    pub oid: Oid,
    pub id: Option<String>,
    pub obj: Option<String>,
    pub path: Option<Vec<String>>,
    pub oid_path: Option<OidPath>,
    pub id_path: Option<IdPath>,
}

impl OidInfo {
    /// A record carrying only the OID; every other field is absent.
    pub fn new(oid: Oid) -> Self {
        Self {
            oid,
            ..Self::default()
        }
    }
}

/// Render an OID path root-first, e.g. `0x00/0x01/0x2a`.
pub fn render_oid_path(path: &[Oid]) -> String {
    path.iter()
        .rev()
        .map(Oid::repr)
        .collect::<Vec<_>>()
        .join("/")
}

/// Render an ID path root-first; unresolved labels print as `None`.
pub fn render_id_path(path: &[Option<String>]) -> String {
    path.iter()
        .rev()
        .map(|label| label.as_deref().unwrap_or(ABSENT))
        .collect::<Vec<_>>()
        .join("/")
}

impl fmt::Display for OidInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_absent(value: Option<String>) -> String {
            value.unwrap_or_else(|| ABSENT.to_string())
        }

        writeln!(f, "oid: {}", self.oid.repr())?;
        writeln!(f, "id: {}", or_absent(self.id.clone()))?;
        writeln!(f, "obj: {}", or_absent(self.obj.clone()))?;
        writeln!(f, "path: {}", or_absent(self.path.as_ref().map(|p| p.join("/"))))?;
        writeln!(
            f,
            "oid_path: {}",
            or_absent(self.oid_path.as_deref().map(render_oid_path))
        )?;
        write!(
            f,
            "id_path: {}",
            or_absent(self.id_path.as_deref().map(render_id_path))
        )
    }
}
