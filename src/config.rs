use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::theme::ThemeMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_cache_max_age_days")]
    pub cache_max_age_days: u32,

    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    #[serde(default)]
    pub theme: ThemeMode,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skygaze");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("apod.db").to_string_lossy().to_string()
}

fn default_api_key() -> String {
    // NASA's public demo key; rate limited but enough for casual browsing
    "DEMO_KEY".to_string()
}

fn default_page_size() -> usize {
    4
}

fn default_cache_max_age_days() -> u32 {
    7
}

fn default_probe_url() -> String {
    "https://www.google.com".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            api_key: default_api_key(),
            page_size: default_page_size(),
            cache_max_age_days: default_cache_max_age_days(),
            probe_url: default_probe_url(),
            theme: ThemeMode::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skygaze")
            .join("config.toml")
    }
}
