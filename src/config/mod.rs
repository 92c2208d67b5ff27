use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::{NewsflowError, Result};

/// Remote endpoint configuration. The article-list host speaks a
/// NewsAPI-style protocol, the parser host a Mercury-style one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_news_base_url")]
    pub news_base_url: String,
    #[serde(default = "default_parser_base_url")]
    pub parser_base_url: String,
    #[serde(default)]
    pub news_api_key: String,
    #[serde(default)]
    pub parser_api_key: String,
}

fn default_news_base_url() -> String {
    "https://newsapi.org".to_string()
}

fn default_parser_base_url() -> String {
    "https://mercury.postlight.com".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            news_base_url: default_news_base_url(),
            parser_base_url: default_parser_base_url(),
            news_api_key: String::new(),
            parser_api_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    /// Database path override; defaults to the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Preferences file override; defaults next to the database.
    pub prefs_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("newsflow").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| NewsflowError::Config(e.to_string()))
    }
}
