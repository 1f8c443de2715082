//! Construction of OID paths by following the best back-reference.
//!
//! Starting at the queried OID, each step picks the lowest-scored
//! back-reference that is not already excluded, then excludes it for all
//! later steps. The path therefore never repeats an OID and has at most as
//! many elements as the graph has objects.

use std::collections::HashSet;

use oidtrace_types::{Oid, OidPath};
use tracing::{debug, warn};

use crate::path_cache::{OidPathCache, PathLookup};
use crate::score::{ReferenceScorer, Score};

/// Builds OID paths on top of a scorer and the session's path cache.
pub struct PathResolver<'a> {
    scorer: ReferenceScorer<'a>,
    cache: &'a mut OidPathCache,
}

impl<'a> PathResolver<'a> {
    pub fn new(scorer: ReferenceScorer<'a>, cache: &'a mut OidPathCache) -> Self {
        Self { scorer, cache }
    }

    /// The lowest-scored back-reference of `target` outside `excluded`.
    ///
    /// Ties go to the smallest OID.
    pub fn best_back_reference(&mut self, target: &Oid, excluded: &HashSet<Oid>) -> Option<Oid> {
        self.ranked_back_references(target, excluded)
            .into_iter()
            .next()
            .map(|(oid, _)| oid)
    }

    /// Eligible back-references of `target` with their scores, best first.
    pub fn ranked_back_references(
        &mut self,
        target: &Oid,
        excluded: &HashSet<Oid>,
    ) -> Vec<(Oid, Score)> {
        let maps = self.scorer.maps();
        let mut ranked: Vec<(Oid, Score)> = maps
            .back_references(target)
            .iter()
            .filter(|oid| !excluded.contains(*oid))
            .map(|source| (*source, self.scorer.score(source, target)))
            .collect();
        ranked.sort_by_key(|(oid, score)| (*score, *oid));
        ranked
    }

    /// Resolve the OID path of `oid` without any OID excluded up front.
    pub fn resolve(&mut self, oid: &Oid) -> OidPath {
        self.resolve_excluding(oid, &[])
    }

    /// Resolve the OID path of `oid`, never passing through `forbidden`.
    ///
    /// A cached path is reused only when it avoids both `forbidden` and the
    /// part of the path built so far. Every suffix of the result is cached.
    pub fn resolve_excluding(&mut self, oid: &Oid, forbidden: &[Oid]) -> OidPath {
        let mut excluded: HashSet<Oid> = forbidden.iter().copied().collect();
        let mut path: OidPath = Vec::new();
        let mut current = *oid;

        loop {
            match self.cache.lookup(&current, |o| excluded.contains(o)) {
                PathLookup::Hit(cached) => {
                    debug!(oid = %current, "OID path cache hit");
                    path.extend_from_slice(cached);
                    break;
                }
                PathLookup::Rejected(cached) => {
                    warn!(
                        oid = %current,
                        preceding = %render(&path),
                        cached = %render(cached),
                        "cached OID path crosses an excluded OID; recomputing"
                    );
                }
                PathLookup::Miss => debug!(oid = %current, "OID path cache miss"),
            }

            path.push(current);
            excluded.insert(current);

            match self.best_back_reference(&current, &excluded) {
                Some(next) => current = next,
                None => break,
            }
        }

        self.cache.insert_suffixes(&path);
        path
    }
}

fn render(path: &[Oid]) -> String {
    path.iter().map(Oid::repr).collect::<Vec<_>>().join("/")
}
