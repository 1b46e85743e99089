//! Application configuration
//!
//! Endpoint URLs and client identifiers ship with compiled-in defaults; an
//! optional JSON config file and SCREENSCOUT_* environment variables override
//! them. The redirect URI used for OAuth must match the provider-registered
//! value byte-for-byte, so it is part of the config rather than derived ad hoc.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default sync (watch-history) provider endpoints
pub const DEFAULT_API_BASE_URL: &str = "https://api.trakt.tv";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://api.trakt.tv/oauth/token";

/// Default metadata provider (TMDB-compatible)
pub const DEFAULT_METADATA_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default AI recommendation provider (Gemini-compatible)
pub const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_MODEL: &str = "gemini-1.5-flash";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OAuth client identifier registered with the sync provider
    pub client_id: String,

    /// Registered redirect URI; the loopback callback server must present
    /// exactly this value during the code exchange
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Sync provider API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Sync provider authorization endpoint
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// Sync provider token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Metadata provider base URL
    #[serde(default = "default_metadata_base_url")]
    pub metadata_base_url: String,

    /// Metadata provider API key
    #[serde(default)]
    pub metadata_api_key: String,

    /// AI recommendation provider base URL
    #[serde(default = "default_ai_base_url")]
    pub ai_base_url: String,

    /// AI recommendation provider API key
    #[serde(default)]
    pub ai_api_key: String,

    /// AI model name
    #[serde(default = "default_ai_model")]
    pub ai_model: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_authorize_url() -> String {
    DEFAULT_AUTHORIZE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_metadata_base_url() -> String {
    DEFAULT_METADATA_BASE_URL.to_string()
}

fn default_ai_base_url() -> String {
    DEFAULT_AI_BASE_URL.to_string()
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            redirect_uri: None,
            api_base_url: default_api_base_url(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            metadata_base_url: default_metadata_base_url(),
            metadata_api_key: String::new(),
            ai_base_url: default_ai_base_url(),
            ai_api_key: String::new(),
            ai_model: default_ai_model(),
        }
    }
}

/// Get the path to the configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("screenscout").join("config.json"))
}

/// Get the path to the application state directory (pending auth, library)
pub fn state_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("screenscout"))
}

impl AppConfig {
    /// Load configuration: defaults, then config file, then env overrides
    pub fn load() -> Result<Self> {
        let path = config_path()?;

        let mut config = if path.exists() {
            let data = fs::read_to_string(&path).context("Failed to read config file")?;
            serde_json::from_str(&data).context("Failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply SCREENSCOUT_* environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SCREENSCOUT_CLIENT_ID") {
            self.client_id = v;
        }
        if let Ok(v) = std::env::var("SCREENSCOUT_METADATA_API_KEY") {
            self.metadata_api_key = v;
        }
        if let Ok(v) = std::env::var("SCREENSCOUT_AI_API_KEY") {
            self.ai_api_key = v;
        }
        if let Ok(v) = std::env::var("SCREENSCOUT_API_BASE_URL") {
            self.api_base_url = v;
        }
    }

    /// Save the configuration to disk with user-only permissions
    pub fn save(&self) -> Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, data).context("Failed to write config file")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "https://api.trakt.tv");
        assert!(config.authorize_url.contains("oauth/authorize"));
        assert!(config.token_url.contains("oauth/token"));
        assert!(config.metadata_base_url.contains("themoviedb.org"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"client_id": "abc123"}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.client_id, "abc123");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.ai_model, DEFAULT_AI_MODEL);
        assert!(config.redirect_uri.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = AppConfig::default();
        config.client_id = "client-1".to_string();
        config.metadata_api_key = "key-1".to_string();

        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.client_id, "client-1");
        assert_eq!(parsed.metadata_api_key, "key-1");
    }
}
