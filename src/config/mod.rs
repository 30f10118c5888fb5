//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calculate::compare::{DEFAULT_MIN_SIMILARITY, DEFAULT_TOP_K};
use crate::calculate::{CompareOptions, SimilarityStrategy, SuggestOptions};
use crate::storage::StorageConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Corpus and comparison configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Corpus file; `TOURNAMENT_META_PATH` still takes precedence
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    /// Ink keyword table replacing the built-in one
    #[serde(default)]
    pub archetype_rules_path: Option<PathBuf>,

    /// Matchup table replacing the built-in one
    #[serde(default)]
    pub matchups_path: Option<PathBuf>,

    /// Switch deck-vs-meta comparison on or off
    #[serde(default = "default_compare_enabled")]
    pub compare_enabled: bool,

    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    #[serde(default)]
    pub strategy: SimilarityStrategy,
}

fn default_compare_enabled() -> bool {
    true
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_min_similarity() -> f64 {
    DEFAULT_MIN_SIMILARITY
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            archetype_rules_path: None,
            matchups_path: None,
            compare_enabled: default_compare_enabled(),
            default_top_k: default_top_k(),
            min_similarity: default_min_similarity(),
            strategy: SimilarityStrategy::default(),
        }
    }
}

impl MetaConfig {
    /// Comparison options seeded from the configured defaults.
    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            top_k: self.default_top_k,
            min_similarity: self.min_similarity,
            strategy: self.strategy,
            ..Default::default()
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub meta: MetaConfig,

    #[serde(default)]
    pub suggest: SuggestOptions,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            meta: MetaConfig::default(),
            suggest: SuggestOptions::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.meta.default_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "meta.default_top_k must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.meta.min_similarity) {
            return Err(ConfigError::ValidationError(format!(
                "meta.min_similarity must be within [0, 1], got {}",
                self.meta.min_similarity
            )));
        }

        let s = &self.suggest;
        for (name, value) in [
            ("add_min_presence", s.add_min_presence),
            ("cut_max_presence", s.cut_max_presence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "suggest.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if s.add_margin < 0.0 || s.cut_margin < 0.0 {
            return Err(ConfigError::ValidationError(
                "suggest margins must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert!(config.meta.compare_enabled);
        assert_eq!(config.meta.default_top_k, 10);
        assert_eq!(config.meta.strategy, SimilarityStrategy::Blended);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_similarity() {
        let mut config = AppConfig::default();
        config.meta.min_similarity = 1.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.meta.default_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_suggest() {
        let mut config = AppConfig::default();
        config.suggest.add_min_presence = 2.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.suggest.cut_margin = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/lorcana"

[meta]
corpus_path = "/srv/lorcana/meta.json"
strategy = "jaccard"

[suggest]
max_suggestions = 5
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/lorcana"));
        assert_eq!(config.meta.corpus_path, Some(PathBuf::from("/srv/lorcana/meta.json")));
        assert_eq!(config.meta.strategy, SimilarityStrategy::Jaccard);
        assert_eq!(config.meta.min_similarity, 0.35);
        assert_eq!(config.suggest.max_suggestions, 5);
        assert_eq!(config.suggest.add_min_presence, 0.45);
        assert_eq!(config.meta.compare_options().strategy, SimilarityStrategy::Jaccard);
        assert_eq!(config.meta.compare_options().top_k, 10);
        assert_eq!(config.storage().corpus_path(), PathBuf::from("/srv/lorcana/tournament_meta.json"));
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let config = AppConfig::load_or_default(Path::new("/definitely/missing/config.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_config_file_rejected() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));

        std::fs::write(&path, "[server\n").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.suggest, parsed.suggest);
    }
}
