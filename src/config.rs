//! Configuration loading: a single TOML file naming the web service
//! endpoint and the results bucket, validated before the command loop
//! starts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

/// File used when the startup prompt is answered with ENTER.
pub const DEFAULT_CONFIG_FILE: &str = "recipeapp.toml";

/// Endpoint shipped in the sample config; calling it is never useful.
const PLACEHOLDER_URL: &str = "https://YOUR_GATEWAY_API.amazonaws.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the recipe service gateway.
    pub webservice: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding rendered recipe text files.
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// Reasons a configured base URL is rejected before the loop is entered.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("baseurl '{0}' is not nearly long enough")]
    TooShort(String),
    #[error("update config file with your gateway endpoint")]
    Placeholder,
    #[error("your URL starts with 'http', it should start with 'https'")]
    NotHttps,
}

/// Read and parse a config file.
pub fn load(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(config)
}

impl Config {
    /// Validate the configured endpoint and normalize away a trailing
    /// slash.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let url = self.client.webservice.as_str();
        if url.len() < 16 {
            return Err(ConfigError::TooShort(url.to_string()));
        }
        if url == PLACEHOLDER_URL {
            return Err(ConfigError::Placeholder);
        }
        if url.starts_with("http:") {
            return Err(ConfigError::NotHttps);
        }
        Ok(url.strip_suffix('/').unwrap_or(url).to_string())
    }
}
