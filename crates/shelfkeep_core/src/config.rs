//! Application and catalog configuration.
//!
//! # Responsibility
//! - Describe catalog policies (persistence trigger, search, recovery).
//! - Load optional TOML configuration for the CLI harness.
//!
//! # Invariants
//! - Every field has a default; an absent config file is not an error.
//! - Unknown keys are rejected so typos surface at startup.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_FILE_NAME: &str = "library.sqlite3";
pub const DEFAULT_CONFIG_FILE_NAME: &str = "shelfkeep.toml";

/// Behavior of title search for an empty or whitespace-only query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyQueryPolicy {
    /// No filter: every record matches.
    #[default]
    MatchAll,
    /// Nothing matches.
    MatchNone,
}

/// What to do when the store file exists but cannot be read as a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptStorePolicy {
    /// Abort catalog construction with a persistence error.
    #[default]
    Fail,
    /// Move the corrupt file aside and start with an empty catalog.
    StartEmpty,
}

/// Policies applied by [`crate::Catalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Persist immediately after a successful `add`.
    pub persist_on_add: bool,
    pub empty_title_query: EmptyQueryPolicy,
    pub on_corrupt_store: CorruptStorePolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            persist_on_add: true,
            empty_title_query: EmptyQueryPolicy::MatchAll,
            on_corrupt_store: CorruptStorePolicy::Fail,
        }
    }
}

/// Top-level configuration consumed by the CLI harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Catalog store file; relative paths resolve against the working directory.
    pub store_path: PathBuf,
    /// One of `trace|debug|info|warn|error`; defaults per build mode.
    pub log_level: Option<String>,
    /// Absolute log directory; defaults to `<cwd>/logs`.
    pub log_dir: Option<PathBuf>,
    pub catalog: CatalogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_FILE_NAME),
            log_level: None,
            log_dir: None,
            catalog: CatalogConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

impl AppConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads configuration from `path`, falling back to defaults when absent.
    ///
    /// # Errors
    /// - `ConfigError::Read` when the file exists but cannot be read.
    /// - `ConfigError::Parse` when the contents are not valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, CatalogConfig, ConfigError, CorruptStorePolicy, EmptyQueryPolicy};
    use std::path::PathBuf;

    #[test]
    fn defaults_persist_on_add_and_match_all() {
        let config = CatalogConfig::default();
        assert!(config.persist_on_add);
        assert_eq!(config.empty_title_query, EmptyQueryPolicy::MatchAll);
        assert_eq!(config.on_corrupt_store, CorruptStorePolicy::Fail);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn toml_overrides_nested_catalog_policies() {
        let config = AppConfig::from_toml_str(
            r#"
store_path = "data/books.sqlite3"
log_level = "warn"

[catalog]
persist_on_add = false
empty_title_query = "match_none"
on_corrupt_store = "start_empty"
"#,
        )
        .unwrap();

        assert_eq!(config.store_path, PathBuf::from("data/books.sqlite3"));
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert!(!config.catalog.persist_on_add);
        assert_eq!(config.catalog.empty_title_query, EmptyQueryPolicy::MatchNone);
        assert_eq!(
            config.catalog.on_corrupt_store,
            CorruptStorePolicy::StartEmpty
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml_str("store_pth = \"x\"").unwrap_err();
        assert!(err.to_string().contains("store_pth"), "unexpected error: {err}");
    }

    #[test]
    fn load_falls_back_to_defaults_and_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelfkeep.toml");
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());

        std::fs::write(&path, "[catalog]\npersist_on_add = \"yes\"\n").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "unexpected error: {err}");
    }
}
