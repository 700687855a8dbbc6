/// Application configuration
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::search::{TermPartition, DEFAULT_CURRENT_TERM};

/// Local storage key the guest schedule is kept under.
pub const DEFAULT_STORAGE_KEY: &str = "mcgill-exam-schedule";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration, read from a JSON file.
///
/// Every field has a default, so a partial (or missing) file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Term tags shown in the "current" view
    pub current_terms: Vec<String>,
    pub storage_key: String,
    /// Directory backing the guest schedule store
    pub storage_dir: PathBuf,
    pub current_catalog_path: PathBuf,
    pub historical_catalog_path: PathBuf,
    pub bind_address: String,
}

impl AppConfig {
    /// Loads the config at `path`, falling back to defaults if it doesn't
    /// exist.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn term_partition(&self) -> TermPartition {
        TermPartition::new(self.current_terms.iter().cloned())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            current_terms: vec![DEFAULT_CURRENT_TERM.to_string()],
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from("data/storage"),
            current_catalog_path: PathBuf::from("data/current_exams.csv"),
            historical_catalog_path: PathBuf::from("data/historical_exams.csv"),
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "current_terms": ["W2026", "S2026"] }"#).unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();

        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert!(config.term_partition().is_current("S2026"));
        assert!(!config.term_partition().is_current("F2024"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();

        assert!(matches!(
            AppConfig::load_from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
