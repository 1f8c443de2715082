//! Memo of resolved OID paths.
//!
//! Resolving `[a, b, c, d]` also settles the paths of `b`, `c` and `d`, so
//! every suffix is remembered. The first path stored for an OID is kept
//! forever; later insertions never overwrite it.

use std::collections::HashMap;

use oidtrace_types::{Oid, OidPath};

/// Outcome of a cache lookup against a set of excluded OIDs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathLookup<'a> {
    /// A cached path that avoids every excluded OID.
    Hit(&'a [Oid]),
    /// A cached path exists but passes through an excluded OID.
    Rejected(&'a [Oid]),
    Miss,
}

/// Suffix-complete cache of OID paths.
#[derive(Debug, Default)]
pub struct OidPathCache {
    paths: HashMap<Oid, OidPath>,
}

impl OidPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, oid: &Oid) -> Option<&[Oid]> {
        self.paths.get(oid).map(Vec::as_slice)
    }

    /// Look up the path of `oid`, accepting it only if `is_excluded` holds
    /// for none of its elements.
    pub fn lookup(&self, oid: &Oid, is_excluded: impl Fn(&Oid) -> bool) -> PathLookup<'_> {
        match self.get(oid) {
            None => PathLookup::Miss,
            Some(path) if path.iter().any(&is_excluded) => PathLookup::Rejected(path),
            Some(path) => PathLookup::Hit(path),
        }
    }

    /// Remember every suffix of `path` whose head has no entry yet.
    /// Returns the number of new entries.
    pub fn insert_suffixes(&mut self, path: &[Oid]) -> usize {
        let mut inserted = 0;
        for start in 0..path.len() {
            self.paths.entry(path[start]).or_insert_with(|| {
                inserted += 1;
                path[start..].to_vec()
            });
        }
        inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oids(ns: &[u64]) -> Vec<Oid> {
        ns.iter().copied().map(Oid::from_u64).collect()
    }

    #[test]
    fn every_suffix_is_cached() {
        let mut cache = OidPathCache::new();
        let path = oids(&[4, 3, 2, 1]);
        assert_eq!(cache.insert_suffixes(&path), 4);
        assert_eq!(cache.get(&Oid::from_u64(3)), Some(oids(&[3, 2, 1]).as_slice()));
        assert_eq!(cache.get(&Oid::from_u64(1)), Some(oids(&[1]).as_slice()));
    }

    #[test]
    fn first_writer_wins() {
        let mut cache = OidPathCache::new();
        cache.insert_suffixes(&oids(&[3, 2, 1]));
        assert_eq!(cache.insert_suffixes(&oids(&[5, 2, 7])), 1);
        assert_eq!(cache.get(&Oid::from_u64(2)), Some(oids(&[2, 1]).as_slice()));
        assert_eq!(cache.get(&Oid::from_u64(7)), None);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn lookup_rejects_paths_through_excluded_oids() {
        let mut cache = OidPathCache::new();
        cache.insert_suffixes(&oids(&[3, 2, 1]));
        let three = Oid::from_u64(3);

        assert_eq!(cache.lookup(&Oid::from_u64(9), |_| false), PathLookup::Miss);
        assert!(matches!(cache.lookup(&three, |_| false), PathLookup::Hit(p) if p.len() == 3));
        assert!(matches!(
            cache.lookup(&three, |o| *o == Oid::from_u64(1)),
            PathLookup::Rejected(_)
        ));
    }
}
