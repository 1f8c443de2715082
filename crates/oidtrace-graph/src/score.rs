//! Heuristic ranking of back-references.
//!
//! A score says how likely `source -> target` is the structural (container
//! to contained) edge rather than an index, relation, or bookkeeping edge.
//! Scores run from 0 to 100; lower is better.
//!
//! Rules, first match wins:
//!
//! 1. `target` also references `source` (relation-style link): 90.
//! 2. `source` has an identifier: 20 for the auth adapter, 60 for the
//!    catalog, 10 otherwise.
//! 3. The attribute holding `target` is a generic id/ref container: 80;
//!    an internal tree or blob slot: 20.
//! 4. No or an empty attribute name, or the first-bucket slot: look ahead through the
//!    back-references of `source` (roles swapped, one level less). A best
//!    lookahead score of 50 or less gives 30, anything else 70.
//! 5. Any other named attribute: 50.
//!
//! The lookahead does not track visited objects; only its depth bounds it.

use std::collections::HashMap;

use oidtrace_types::Oid;
use tracing::trace;

use crate::config::ScoringRules;
use crate::inspect::Inspector;
use crate::maps::ReferenceMaps;

/// Reference score, 0 to 100, lower is better.
pub type Score = u8;

pub const BIDIRECTIONAL: Score = 90;
pub const NAMED_SOURCE: Score = 10;
pub const AUTH_ADAPTER_SOURCE: Score = 20;
pub const CATALOG_SOURCE: Score = 60;
pub const BAD_ATTR: Score = 80;
pub const GOOD_ATTR: Score = 20;
pub const PROMISING_LOOKAHEAD: Score = 30;
pub const UNNAMED: Score = 70;
pub const DEFAULT: Score = 50;

/// Best lookahead score that still counts as promising.
const LOOKAHEAD_THRESHOLD: Score = 50;

/// Memoized scores keyed by `(source, target, remaining lookahead depth)`.
#[derive(Debug, Default)]
pub struct ScoreMemo(HashMap<(Oid, Oid, u8), Score>);

impl ScoreMemo {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Scores candidate back-references against one set of reference maps.
///
/// Borrows the session state it needs for the duration of a query.
pub struct ReferenceScorer<'a> {
    maps: &'a ReferenceMaps,
    inspector: &'a mut Inspector,
    rules: &'a ScoringRules,
    memo: &'a mut ScoreMemo,
}

impl<'a> ReferenceScorer<'a> {
    pub fn new(
        maps: &'a ReferenceMaps,
        inspector: &'a mut Inspector,
        rules: &'a ScoringRules,
        memo: &'a mut ScoreMemo,
    ) -> Self {
        Self {
            maps,
            inspector,
            rules,
            memo,
        }
    }

    pub fn maps(&self) -> &'a ReferenceMaps {
        self.maps
    }

    pub fn inspector(&mut self) -> &mut Inspector {
        self.inspector
    }

    /// Score `source` as the structural parent of `target`.
    pub fn score(&mut self, source: &Oid, target: &Oid) -> Score {
        self.score_at_depth(source, target, self.rules.lookahead_depth)
    }

    fn score_at_depth(&mut self, source: &Oid, target: &Oid, depth: u8) -> Score {
        let key = (*source, *target, depth);
        if let Some(score) = self.memo.0.get(&key) {
            return *score;
        }
        let score = self.compute(source, target, depth);
        trace!(source = %source, target = %target, depth, score, "scored reference");
        self.memo.0.insert(key, score);
        score
    }

    fn compute(&mut self, source: &Oid, target: &Oid, depth: u8) -> Score {
        if self.maps.has_edge(target, source) {
            return BIDIRECTIONAL;
        }

        if let Some(id) = self.inspector.identifier(source) {
            return if id == self.rules.auth_adapter_id {
                AUTH_ADAPTER_SOURCE
            } else if id == self.rules.catalog_id {
                CATALOG_SOURCE
            } else {
                NAMED_SOURCE
            };
        }

        let attr_name = self.inspector.attr_name(target, source);
        match attr_name.as_deref() {
            Some(name) if self.rules.bad_attr_names.iter().any(|n| n == name) => BAD_ATTR,
            Some(name) if self.rules.good_attr_names.iter().any(|n| n == name) => GOOD_ATTR,
            Some(name) if !name.is_empty() && name != self.rules.first_bucket_attr => DEFAULT,
            _ => self.look_ahead(source, depth),
        }
    }

    fn look_ahead(&mut self, source: &Oid, depth: u8) -> Score {
        if depth == 0 {
            return UNNAMED;
        }
        let maps = self.maps;
        let best = maps
            .back_references(source)
            .iter()
            .map(|grandparent| self.score_at_depth(grandparent, source, depth - 1))
            .min();
        if best.is_some_and(|score| score <= LOOKAHEAD_THRESHOLD) {
            PROMISING_LOOKAHEAD
        } else {
            UNNAMED
        }
    }
}
