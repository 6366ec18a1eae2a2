// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// User id that carries the admin role.
    pub admin_user_id: String,
    /// Length of the optimistic premium window when no end date is known.
    pub premium_days: i64,
    /// Durable storage file. Defaults to ~/.nekota/storage.json.
    #[serde(default)]
    pub storage_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            admin_user_id: "admin".into(),
            premium_days: 30,
            storage_file: None,
        }
    }
}

impl SessionConfig {
    pub fn storage_path(&self) -> PathBuf {
        self.storage_file
            .clone()
            .unwrap_or_else(paths::storage_file_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// NEKOTA_API_URL points the client at another backend without editing config.toml.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NEKOTA_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
    }
}
