//! Forward and backward reference maps of one store snapshot.
//!
//! # Invariants
//!
//! - `target ∈ forward[source]` iff `source ∈ backward[target]`.
//! - No map holds an empty set; absence means "no references".
//! - The OID set contains every key and every referenced target.

use std::collections::{BTreeMap, BTreeSet};

use oidtrace_types::Oid;

/// Mapping from an OID to a set of OIDs.
pub type ReferenceMap = BTreeMap<Oid, BTreeSet<Oid>>;

static EMPTY: BTreeSet<Oid> = BTreeSet::new();

/// Reference graph of a store: outgoing edges, their transpose, and every
/// OID discovered.
///
/// Immutable once constructed. The only constructor takes the forward map
/// and derives the backward map from it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceMaps {
    forward: ReferenceMap,
    backward: ReferenceMap,
    oids: BTreeSet<Oid>,
}

impl ReferenceMaps {
    /// Build the maps from a forward map plus OIDs known to exist without
    /// necessarily appearing in any edge (such as an isolated root).
    pub fn from_forward(forward: ReferenceMap, extra_oids: impl IntoIterator<Item = Oid>) -> Self {
        let forward: ReferenceMap = forward
            .into_iter()
            .filter(|(_, targets)| !targets.is_empty())
            .collect();

        let mut backward = ReferenceMap::new();
        let mut oids: BTreeSet<Oid> = extra_oids.into_iter().collect();
        for (source, targets) in &forward {
            oids.insert(*source);
            for target in targets {
                oids.insert(*target);
                backward.entry(*target).or_default().insert(*source);
            }
        }

        Self {
            forward,
            backward,
            oids,
        }
    }

    /// OIDs directly referenced by `oid`.
    pub fn references(&self, oid: &Oid) -> &BTreeSet<Oid> {
        self.forward.get(oid).unwrap_or(&EMPTY)
    }

    /// OIDs that directly reference `oid`.
    pub fn back_references(&self, oid: &Oid) -> &BTreeSet<Oid> {
        self.backward.get(oid).unwrap_or(&EMPTY)
    }

    /// Returns `true` if `source` holds a direct reference to `target`.
    pub fn has_edge(&self, source: &Oid, target: &Oid) -> bool {
        self.references(source).contains(target)
    }

    pub fn forward(&self) -> &ReferenceMap {
        &self.forward
    }

    pub fn backward(&self) -> &ReferenceMap {
        &self.backward
    }

    pub fn oids(&self) -> &BTreeSet<Oid> {
        &self.oids
    }

    /// Add OIDs to the discovered set without adding edges.
    pub(crate) fn extend_oids(&mut self, oids: impl IntoIterator<Item = Oid>) {
        self.oids.extend(oids);
    }

    /// Total number of (source, target) edges.
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Every edge in (source, target) order.
    pub fn edges(&self) -> impl Iterator<Item = (Oid, Oid)> + '_ {
        self.forward
            .iter()
            .flat_map(|(source, targets)| targets.iter().map(move |target| (*source, *target)))
    }
}
