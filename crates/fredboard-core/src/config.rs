//! Application configuration management.
//!
//! Settings live at `~/.config/fredboard/config.json` (platform config dir)
//! and fall back to defaults when the file is missing. The FRED API key is
//! deliberately not a config field; see `credentials`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::{ClientOptions, DEFAULT_TIMEOUT_SECS, FRED_BASE_URL};
use crate::cache::DEFAULT_STALE_MINUTES;
use crate::models::RangePreset;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "fredboard";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where `saved_metrics.json` lives; platform data dir when unset.
    pub data_dir: Option<PathBuf>,
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Retries after a 429 response. Zero leaves retrying to the caller.
    pub max_rate_limit_retries: u32,
    pub default_range: RangePreset,
    pub cache_stale_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            base_url: FRED_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_rate_limit_retries: 0,
            default_range: RangePreset::All,
            cache_stale_minutes: DEFAULT_STALE_MINUTES,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            max_rate_limit_retries: self.max_rate_limit_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.max_rate_limit_retries, 0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"default_range": "5y", "max_rate_limit_retries": 2}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.default_range, RangePreset::FiveYears);
        assert_eq!(config.max_rate_limit_retries, 2);
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            data_dir: Some(dir.path().join("data")),
            cache_stale_minutes: 15,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
        assert_eq!(config.data_dir().unwrap(), dir.path().join("data"));
    }

    #[test]
    fn test_client_options() {
        let config = Config {
            base_url: "http://localhost:8080/fred/".to_string(),
            request_timeout_secs: 5,
            ..Default::default()
        };
        let options = config.client_options();
        assert_eq!(options.base_url, "http://localhost:8080/fred");
        assert_eq!(options.timeout, Duration::from_secs(5));
    }
}
