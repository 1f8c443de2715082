use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directory name used under the user cache directory.
pub const PACKAGE_NAME: &str = "oidtrace";

/// Tables driving the reference scorer.
///
/// The defaults are empirically tuned against real object databases. Changing
/// them changes which paths get reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Identifier of the authentication adapter; referencing objects with
    /// this id are discouraged but still acceptable.
    pub auth_adapter_id: String,
    /// Identifier of the catalog that indexes every object.
    pub catalog_id: String,
    /// Attribute names of generic id/reference containers.
    pub bad_attr_names: Vec<String>,
    /// Attribute names of internal tree and blob storage.
    pub good_attr_names: Vec<String>,
    /// Attribute name of a tree's first bucket, treated like a missing name.
    pub first_bucket_attr: String,
    /// How many back-reference levels an unnamed reference may look ahead.
    pub lookahead_depth: u8,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            auth_adapter_id: "ldapauth".into(),
            catalog_id: "IIntIds".into(),
            bad_attr_names: vec!["ids".into(), "refs".into(), "_next".into()],
            good_attr_names: vec!["_tree".into(), "_blob".into()],
            first_bucket_attr: "_firstbucket".into(),
            lookahead_depth: 3,
        }
    }
}

/// Configuration for one analysis session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Where reference caches live. `None` means [`default_cache_dir`].
    pub cache_dir: Option<PathBuf>,
    /// Whether `build` may read and write the reference cache.
    pub use_cache: bool,
    /// Maximum number of characters kept from an object's string form.
    pub describe_limit: usize,
    pub scoring: ScoringRules,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            use_cache: true,
            describe_limit: 50,
            scoring: ScoringRules::default(),
        }
    }
}

impl AnalysisConfig {
    /// A configuration that never touches the file system.
    pub fn without_cache() -> Self {
        Self {
            use_cache: false,
            ..Default::default()
        }
    }

    /// The cache directory to use, if any can be determined.
    pub fn resolved_cache_dir(&self) -> Option<PathBuf> {
        self.cache_dir.clone().or_else(default_cache_dir)
    }
}

/// `$XDG_CACHE_HOME/oidtrace`, falling back to `$HOME/.cache/oidtrace`.
pub fn default_cache_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    Some(base.join(PACKAGE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = AnalysisConfig::default();
        assert!(c.use_cache);
        assert!(c.cache_dir.is_none());
        assert_eq!(c.describe_limit, 50);
        assert_eq!(c.scoring.lookahead_depth, 3);
        assert_eq!(c.scoring.bad_attr_names, vec!["ids", "refs", "_next"]);
        assert_eq!(c.scoring.good_attr_names, vec!["_tree", "_blob"]);
    }

    #[test]
    fn explicit_cache_dir_wins() {
        let c = AnalysisConfig {
            cache_dir: Some("/var/cache/x".into()),
            ..Default::default()
        };
        assert_eq!(c.resolved_cache_dir(), Some(PathBuf::from("/var/cache/x")));
        assert!(!AnalysisConfig::without_cache().use_cache);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c: AnalysisConfig = toml::from_str(
            r#"
            use_cache = false

            [scoring]
            lookahead_depth = 1
            "#,
        )
        .unwrap();
        assert!(!c.use_cache);
        assert_eq!(c.describe_limit, 50);
        assert_eq!(c.scoring.lookahead_depth, 1);
        assert_eq!(c.scoring.catalog_id, "IIntIds");
    }
}
