//! Full walk of a store from its root object.

use std::collections::BTreeSet;

use oidtrace_store::ObjectStore;
use oidtrace_types::Oid;
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::maps::{ReferenceMap, ReferenceMaps};

/// Log a progress line every this many visited objects.
const PROGRESS_EVERY: usize = 10_000;

/// Walk every object reachable from the store root and record its references.
///
/// Objects are visited at most once: a work list is seeded with the root and
/// each popped OID is skipped if it was already visited. Any load or decode
/// failure aborts the walk; no partial maps escape.
pub fn build_from_scratch(store: &dyn ObjectStore) -> GraphResult<ReferenceMaps> {
    let root = store.root_oid();
    let mut forward = ReferenceMap::new();
    let mut visited: BTreeSet<Oid> = BTreeSet::new();
    let mut pending: Vec<Oid> = vec![root];

    while let Some(current) = pending.pop() {
        if !visited.insert(current) {
            continue;
        }

        let refs = store
            .references_of(&current)
            .map_err(|source| GraphError::StoreRead {
                oid: current,
                source,
            })?;

        if visited.len() % PROGRESS_EVERY == 0 {
            info!(visited = visited.len(), pending = pending.len(), "walking store");
        }

        if refs.is_empty() {
            continue;
        }

        pending.extend(refs.iter().filter(|oid| !visited.contains(*oid)).copied());
        forward.insert(current, refs);
    }

    debug!(
        root = %root,
        objects = visited.len(),
        sources = forward.len(),
        "store walk finished"
    );
    Ok(ReferenceMaps::from_forward(forward, visited))
}
