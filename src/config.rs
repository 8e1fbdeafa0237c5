use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gemini,
    OpenAI,
    None,
}

/// User settings, merged field-by-field over the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendKind,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    /// Overrides the backend's default model name.
    pub model: Option<String>,
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub screenshot_dir: PathBuf,
    pub agent_mode: bool,
    /// Fixed seed for response variety; random when absent.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Gemini,
            gemini_api_key: None,
            openai_api_key: None,
            model: None,
            database_path: PathBuf::from("companion.db"),
            log_dir: default_log_dir(),
            screenshot_dir: PathBuf::from("."),
            agent_mode: false,
            seed: None,
        }
    }
}

fn default_log_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".local/share/companion/logs")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load the config file, falling back to defaults when it doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?
        } else {
            Config::default()
        };

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.gemini_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }

        config.gemini_api_key = non_blank(config.gemini_api_key);
        config.openai_api_key = non_blank(config.openai_api_key);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        let raw = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, raw).map_err(io_err)
    }

    /// API key for the selected backend, if one is configured.
    pub fn active_api_key(&self) -> Option<&str> {
        match self.backend {
            BackendKind::Gemini => self.gemini_api_key.as_deref(),
            BackendKind::OpenAI => self.openai_api_key.as_deref(),
            BackendKind::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend": "openai", "agent_mode": true}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.backend, BackendKind::OpenAI);
        assert!(config.agent_mode);
        assert_eq!(config.database_path, PathBuf::from("companion.db"));
        assert_eq!(config.screenshot_dir, PathBuf::from("."));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_save_then_load_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config {
            seed: Some(7),
            model: Some("gemini-1.5-pro".to_string()),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.seed, Some(7));
        assert_eq!(loaded.model.as_deref(), Some("gemini-1.5-pro"));
    }

    #[test]
    fn test_no_key_for_none_backend() {
        let config = Config {
            backend: BackendKind::None,
            gemini_api_key: Some("abc".to_string()),
            ..Config::default()
        };
        assert_eq!(config.active_api_key(), None);
    }
}
