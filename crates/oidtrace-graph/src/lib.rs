//! Reference graph analysis for oidtrace.
//!
//! Walks an object store once, keeps the forward and backward reference maps
//! of every reachable object, and explains how any object hangs off the root
//! by following the most structural-looking back-reference at each step.
//!
//! # Architecture
//!
//! ```text
//! ObjectStore ──► builder ──► ReferenceMaps ◄──► cache (references_<tid>)
//!                                  │
//!          Inspector ──► ReferenceScorer ──► PathResolver ◄──► OidPathCache
//!                                  │
//!                            GraphSession ──► OidInfo
//! ```
//!
//! [`GraphSession`] owns all of it: one build, then any number of queries.
//! Every memo is session-scoped and never invalidated, so a session must not
//! outlive the store state it was built from.

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod inspect;
pub mod maps;
pub mod path_cache;
pub mod resolver;
pub mod score;
pub mod session;
pub mod transactions;

// Re-export primary types at crate root for ergonomic imports.
pub use builder::build_from_scratch;
pub use cache::{read_edges, write_edges, CacheKey, ReferenceCache};
pub use config::{default_cache_dir, AnalysisConfig, ScoringRules, PACKAGE_NAME};
pub use error::{GraphError, GraphResult};
pub use inspect::{Inspector, ERROR_MARKER, ROOT_ID};
pub use maps::{ReferenceMap, ReferenceMaps};
pub use path_cache::{OidPathCache, PathLookup};
pub use resolver::PathResolver;
pub use score::{ReferenceScorer, Score, ScoreMemo};
pub use session::{BuildSource, GraphSession, IdentifiedBackReference};
pub use transactions::recent_transactions;
