use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use oidtrace_store::{ObjectInspector, ObjectStore, Transaction};
use oidtrace_types::{IdPath, IntoOid, Oid, OidInfo, OidPath};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::builder::build_from_scratch;
use crate::cache::{CacheKey, ReferenceCache};
use crate::config::AnalysisConfig;
use crate::error::{GraphError, GraphResult};
use crate::inspect::Inspector;
use crate::maps::{ReferenceMap, ReferenceMaps};
use crate::path_cache::OidPathCache;
use crate::resolver::PathResolver;
use crate::score::{ReferenceScorer, Score, ScoreMemo};
use crate::transactions;

/// Where the reference maps of a session came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildSource {
    /// Reloaded from the on-disk reference cache.
    Cache,
    /// Built by walking the store.
    Scratch,
}

/// A back-reference of some object, labelled with the attribute name under
/// which it holds that object and scored as a structural parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedBackReference {
    pub oid: Oid,
    pub label: Option<String>,
    pub score: Score,
}

/// One analysis session over a store snapshot.
///
/// Owns the reference maps and every memo derived from them. The store must
/// not change while the session is alive: memoized answers are never
/// invalidated.
pub struct GraphSession {
    store: Arc<dyn ObjectStore>,
    config: AnalysisConfig,
    root: Oid,
    maps: Option<ReferenceMaps>,
    inspector: Inspector,
    scores: ScoreMemo,
    oid_paths: OidPathCache,
    id_paths: HashMap<Oid, IdPath>,
    identified_back_references: HashMap<Oid, Vec<IdentifiedBackReference>>,
}

impl GraphSession {
    /// Start a session; nothing is read until [`build`](Self::build).
    pub fn new(
        store: Arc<dyn ObjectStore>,
        objects: Arc<dyn ObjectInspector>,
        config: AnalysisConfig,
    ) -> Self {
        let root = store.root_oid();
        let inspector = Inspector::new(objects, root, config.describe_limit);
        Self {
            store,
            config,
            root,
            maps: None,
            inspector,
            scores: ScoreMemo::default(),
            oid_paths: OidPathCache::new(),
            id_paths: HashMap::new(),
            identified_back_references: HashMap::new(),
        }
    }

    /// Start a session over a backend that is both store and inspector.
    pub fn from_store<S>(store: Arc<S>, config: AnalysisConfig) -> Self
    where
        S: ObjectStore + ObjectInspector + 'static,
    {
        Self::new(store.clone(), store, config)
    }

    pub fn root_oid(&self) -> Oid {
        self.root
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    // ---- Build ----

    /// Build the reference maps, from the cache when possible.
    ///
    /// May succeed only once per session. On failure nothing is kept and
    /// the call can be retried.
    pub fn build(&mut self) -> GraphResult<BuildSource> {
        if self.maps.is_some() {
            return Err(GraphError::AlreadyBuilt);
        }

        let cache = self.reference_cache()?;
        if let Some((cache, key)) = &cache {
            info!(path = %cache.path_for(key).display(), "reference cache location");
            match cache.load(key) {
                Ok(Some(mut maps)) => {
                    maps.extend_oids([self.root]);
                    self.log_sizes(&maps, BuildSource::Cache);
                    self.maps = Some(maps);
                    return Ok(BuildSource::Cache);
                }
                Ok(None) => info!("reference cache not found; walking the store"),
                Err(e) => warn!(error = %e, "unusable reference cache; walking the store"),
            }
        }

        let maps = build_from_scratch(self.store.as_ref())?;

        if let Some((cache, key)) = &cache {
            if let Err(e) = cache.store(key, &maps) {
                warn!(error = %e, "failed to store reference cache");
            }
        }

        self.log_sizes(&maps, BuildSource::Scratch);
        self.maps = Some(maps);
        Ok(BuildSource::Scratch)
    }

    pub fn is_built(&self) -> bool {
        self.maps.is_some()
    }

    fn reference_cache(&self) -> GraphResult<Option<(ReferenceCache, CacheKey)>> {
        if !self.config.use_cache {
            return Ok(None);
        }
        let Some(dir) = self.config.resolved_cache_dir() else {
            warn!("no cache directory could be determined; reference cache disabled");
            return Ok(None);
        };
        let key = CacheKey::from_tid(&self.store.latest_transaction_id()?);
        Ok(Some((ReferenceCache::new(dir), key)))
    }

    fn log_sizes(&self, maps: &ReferenceMaps, source: BuildSource) {
        info!(
            ?source,
            references = maps.forward().len(),
            back_references = maps.backward().len(),
            oids = maps.oids().len(),
            "reference maps ready"
        );
    }

    // ---- References ----

    pub fn maps(&self) -> GraphResult<&ReferenceMaps> {
        self.maps.as_ref().ok_or(GraphError::NotBuilt)
    }

    /// Every OID discovered by the build.
    pub fn oids(&self) -> GraphResult<&BTreeSet<Oid>> {
        Ok(self.maps()?.oids())
    }

    pub fn reference_map(&self) -> GraphResult<&ReferenceMap> {
        Ok(self.maps()?.forward())
    }

    pub fn back_reference_map(&self) -> GraphResult<&ReferenceMap> {
        Ok(self.maps()?.backward())
    }

    /// OIDs referenced by `oid`.
    pub fn get_references(&self, oid: impl IntoOid) -> GraphResult<&BTreeSet<Oid>> {
        let oid = oid.into_oid()?;
        Ok(self.maps()?.references(&oid))
    }

    /// OIDs that reference `oid`.
    pub fn get_back_references(&self, oid: impl IntoOid) -> GraphResult<&BTreeSet<Oid>> {
        let oid = oid.into_oid()?;
        Ok(self.maps()?.back_references(&oid))
    }

    /// Back-references of `oid` with the attribute name under which each
    /// holds it and its score, in OID order.
    pub fn get_identified_back_references(
        &mut self,
        oid: impl IntoOid,
    ) -> GraphResult<Vec<IdentifiedBackReference>> {
        let oid = oid.into_oid()?;
        if let Some(found) = self.identified_back_references.get(&oid) {
            return Ok(found.clone());
        }
        let maps = self.maps.as_ref().ok_or(GraphError::NotBuilt)?;
        let mut scorer = ReferenceScorer::new(
            maps,
            &mut self.inspector,
            &self.config.scoring,
            &mut self.scores,
        );
        let found: Vec<IdentifiedBackReference> = maps
            .back_references(&oid)
            .iter()
            .map(|source| IdentifiedBackReference {
                oid: *source,
                label: scorer.inspector().attr_name(&oid, source),
                score: scorer.score(source, &oid),
            })
            .collect();
        self.identified_back_references.insert(oid, found.clone());
        Ok(found)
    }

    /// Score `source` as the structural parent of `target`.
    pub fn score(&mut self, source: impl IntoOid, target: impl IntoOid) -> GraphResult<Score> {
        let (source, target) = (source.into_oid()?, target.into_oid()?);
        let maps = self.maps.as_ref().ok_or(GraphError::NotBuilt)?;
        Ok(ReferenceScorer::new(
            maps,
            &mut self.inspector,
            &self.config.scoring,
            &mut self.scores,
        )
        .score(&source, &target))
    }

    // ---- Paths ----

    /// OID path of `oid`: the object itself followed by its chain of best
    /// back-references.
    pub fn get_oid_path(&mut self, oid: impl IntoOid) -> GraphResult<OidPath> {
        self.get_oid_path_excluding(oid, &[])
    }

    /// OID path of `oid` that never passes through `forbidden`.
    pub fn get_oid_path_excluding(
        &mut self,
        oid: impl IntoOid,
        forbidden: &[Oid],
    ) -> GraphResult<OidPath> {
        let oid = oid.into_oid()?;
        Ok(self.resolver()?.resolve_excluding(&oid, forbidden))
    }

    /// ID path of `oid`, element for element along its OID path.
    pub fn get_id_path(&mut self, oid: impl IntoOid) -> GraphResult<IdPath> {
        let oid = oid.into_oid()?;
        if let Some(path) = self.id_paths.get(&oid) {
            return Ok(path.clone());
        }
        let oid_path = self.get_oid_path(oid)?;
        let id_path: IdPath = oid_path
            .iter()
            .enumerate()
            .map(|(i, child)| self.inspector.id_or_attr_name(child, oid_path.get(i + 1)))
            .collect();
        self.id_paths.insert(oid, id_path.clone());
        Ok(id_path)
    }

    fn resolver(&mut self) -> GraphResult<PathResolver<'_>> {
        let maps = self.maps.as_ref().ok_or(GraphError::NotBuilt)?;
        let scorer = ReferenceScorer::new(
            maps,
            &mut self.inspector,
            &self.config.scoring,
            &mut self.scores,
        );
        Ok(PathResolver::new(scorer, &mut self.oid_paths))
    }

    // ---- Objects ----

    /// Everything known about `oid`, for display.
    ///
    /// Unreadable objects leave their fields absent or marked; only a
    /// missing build or malformed input is an error.
    pub fn get_oid_info(&mut self, oid: impl IntoOid) -> GraphResult<OidInfo> {
        let oid = oid.into_oid()?;
        let oid_path = self.get_oid_path(oid)?;
        let id_path = self.get_id_path(oid)?;
        Ok(OidInfo {
            oid,
            id: self.inspector.identifier(&oid),
            obj: Some(self.inspector.describe(&oid)),
            path: self.inspector.physical_path(&oid),
            oid_path: Some(oid_path),
            id_path: Some(id_path),
        })
    }

    /// Bounded string form of the object.
    pub fn get_obj_as_str(&mut self, oid: impl IntoOid) -> GraphResult<String> {
        Ok(self.inspector.describe(&oid.into_oid()?))
    }

    pub fn get_id(&mut self, oid: impl IntoOid) -> GraphResult<Option<String>> {
        Ok(self.inspector.identifier(&oid.into_oid()?))
    }

    /// Name of the attribute under which `parent` holds `oid`.
    pub fn get_attr_name(
        &mut self,
        oid: impl IntoOid,
        parent: impl IntoOid,
    ) -> GraphResult<Option<String>> {
        let (oid, parent) = (oid.into_oid()?, parent.into_oid()?);
        Ok(self.inspector.attr_name(&oid, &parent))
    }

    pub fn get_physical_path(&mut self, oid: impl IntoOid) -> GraphResult<Option<Vec<String>>> {
        Ok(self.inspector.physical_path(&oid.into_oid()?))
    }

    // ---- Transactions ----

    /// OIDs modified by each transaction, oldest first.
    pub fn oids_modified_by_each_transaction(&self) -> GraphResult<Vec<Vec<Oid>>> {
        Ok(self
            .store
            .iterate_transactions()?
            .into_iter()
            .map(|t| t.oids)
            .collect())
    }

    /// OIDs modified by the most recent transaction; empty for an empty log.
    pub fn oids_modified_by_last_transaction(&self) -> GraphResult<Vec<Oid>> {
        Ok(self
            .store
            .iterate_transactions()?
            .pop()
            .map(|t| t.oids)
            .unwrap_or_default())
    }

    /// Window of transactions counted back from the most recent one (index 0).
    pub fn recent_transactions(
        &self,
        start: usize,
        count: usize,
    ) -> GraphResult<Vec<(usize, Transaction)>> {
        let log = self.store.iterate_transactions()?;
        Ok(transactions::recent_transactions(&log, start, count)
            .into_iter()
            .map(|(index, t)| (index, t.clone()))
            .collect())
    }
}

impl std::fmt::Debug for GraphSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSession")
            .field("root", &self.root)
            .field("built", &self.maps.is_some())
            .field("cached_paths", &self.oid_paths.len())
            .field("cached_scores", &self.scores.len())
            .finish()
    }
}
