//! TOML configuration for the command line tool.
//!
//! Lookup order: `--config`, then `TRACER_SURVEY_CONFIG`, then
//! `config.toml` in the platform config directory. Missing sections fall
//! back to built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use survey_store::{DEFAULT_KEY_PREFIX, PinSeed};
use tracing::debug;

pub const CONFIG_ENV: &str = "TRACER_SURVEY_CONFIG";
const DRAFTS_FILE: &str = "drafts.json";
const DEFAULT_ENCRYPTION_KEY: &str = "tracer-survey-local-key";
const DEFAULT_PIN_SALT: &str = "tracer-survey-pin-salt";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage: StorageConfig,
    pub pins: PinConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
    pub key_prefix: String,
    pub encryption_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            encryption_key: DEFAULT_ENCRYPTION_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinConfig {
    pub salt: String,
    pub tracer_study: Vec<String>,
    pub user_survey: Vec<String>,
}

impl Default for PinConfig {
    fn default() -> Self {
        let seed = PinSeed::default();
        Self {
            salt: DEFAULT_PIN_SALT.to_string(),
            tracer_study: seed.tracer_study,
            user_survey: seed.user_survey,
        }
    }
}

impl PinConfig {
    pub fn seed(&self) -> PinSeed {
        PinSeed {
            tracer_study: self.tracer_study.clone(),
            user_survey: self.user_survey.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// Configuration together with the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid configuration")
    }

    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
        let candidate = match explicit {
            Some(path) => Some((path.to_path_buf(), true)),
            None => match env::var_os(CONFIG_ENV) {
                Some(path) if !path.is_empty() => Some((PathBuf::from(path), true)),
                _ => project_dirs().map(|dirs| (dirs.config_dir().join("config.toml"), false)),
            },
        };

        let Some((path, required)) = candidate else {
            return Ok(LoadedConfig {
                config: Config::default(),
                source: None,
            });
        };

        if !required && !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(LoadedConfig {
                config: Config::default(),
                source: None,
            });
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(LoadedConfig {
            config,
            source: Some(path),
        })
    }

    /// Directory holding local draft data.
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.storage.data_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".tracer-survey"))
    }

    pub fn drafts_path(&self) -> PathBuf {
        self.data_dir().join(DRAFTS_FILE)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("id", "tracer-study", "tracer-survey")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").expect("empty config");
        assert_eq!(config, Config::default());
        assert_eq!(config.storage.key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(config.pins.seed(), PinSeed::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = Config::from_toml(
            r#"
[storage]
data_dir = "/var/lib/tracer"

[pins]
tracer_study = ["111111"]
"#,
        )
        .expect("partial config");
        assert_eq!(config.drafts_path(), PathBuf::from("/var/lib/tracer/drafts.json"));
        assert_eq!(config.storage.encryption_key, DEFAULT_ENCRYPTION_KEY);
        assert_eq!(config.pins.tracer_study, vec!["111111"]);
        assert_eq!(config.pins.user_survey, PinSeed::default().user_survey);
        assert!(config.api.base_url.is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = Config::from_toml("[storage]\ndatadir = \"x\"\n").expect_err("typo rejected");
        assert!(format!("{err:#}").contains("datadir"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let temp = tempfile::TempDir::new().expect("tempdir");
        let missing = temp.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }
}
