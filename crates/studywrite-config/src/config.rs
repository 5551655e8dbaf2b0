/// Application configuration: load, save, and sanitize.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Bounds applied by [`AppConfig::sanitize`].
const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 120;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Endpoint the analysis requests are posted to.
    pub analysis_endpoint: String,
    /// Endpoint acceptance feedback is posted to. Empty = disabled.
    pub feedback_endpoint: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Ceiling for one analysis request, in seconds.
    pub request_timeout_secs: u64,
    /// Mode used when the CLI does not specify one.
    pub default_mode: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis_endpoint: "https://api.studywrite.app/v1/analyze".to_string(),
            feedback_endpoint: "https://api.studywrite.app/v1/feedback".to_string(),
            api_key_env: "STUDYWRITE_API_KEY".to_string(),
            request_timeout_secs: 30,
            default_mode: "proofread".to_string(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path: `<config dir>/studywrite/config.json`.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("studywrite").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("studywrite.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Leave the broken file in place and run on defaults
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps out-of-range values to usable bounds.
    pub fn sanitize(&mut self) {
        self.request_timeout_secs = self
            .request_timeout_secs
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        if self.api_key_env.trim().is_empty() {
            self.api_key_env = "STUDYWRITE_API_KEY".to_string();
        }
    }

    /// Resolves the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }
}
