use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub store: Option<StoreConfig>,
    pub matching: Option<MatchingConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite graph database.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Candidate limit for ad-hoc `resolve --fuzzy` lookups.
    pub candidate_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter (overridden by `RUST_LOG`).
    pub filter: Option<String>,
}

/// Platform config directory path: `<config_dir>/litgraph/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("litgraph").join("config.toml"))
}

/// Load config by cascading CWD `.litgraph.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(&PathBuf::from(".litgraph.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &PathBuf) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        store: Some(StoreConfig {
            path: overlay
                .store
                .as_ref()
                .and_then(|s| s.path.clone())
                .or_else(|| base.store.as_ref().and_then(|s| s.path.clone())),
        }),
        matching: Some(MatchingConfig {
            candidate_limit: overlay
                .matching
                .as_ref()
                .and_then(|m| m.candidate_limit)
                .or_else(|| base.matching.as_ref().and_then(|m| m.candidate_limit)),
        }),
        logging: Some(LoggingConfig {
            filter: overlay
                .logging
                .as_ref()
                .and_then(|l| l.filter.clone())
                .or_else(|| base.logging.as_ref().and_then(|l| l.filter.clone())),
        }),
    }
}

impl ConfigFile {
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store
            .as_ref()
            .and_then(|s| s.path.as_deref())
            .map(PathBuf::from)
    }

    pub fn candidate_limit(&self) -> Option<usize> {
        self.matching.as_ref().and_then(|m| m.candidate_limit)
    }

    pub fn log_filter(&self) -> Option<String> {
        self.logging.as_ref().and_then(|l| l.filter.clone())
    }
}
