//! Configuration settings management
//!
//! This module handles loading configuration from a TOML or JSON file,
//! environment overrides, and validation.

use crate::error::{LalinkError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_API_VERSION: &str = "2020-08-01";

/// Per-operation deadlines, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceTimeouts {
    pub create: u64,
    pub read: u64,
    pub update: u64,
    pub delete: u64,
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self {
            create: 30 * 60,
            read: 5 * 60,
            update: 30 * 60,
            delete: 30 * 60,
        }
    }
}

impl ResourceTimeouts {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update)
    }

    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub client_secret: String,
    pub resource_manager_endpoint: String,
    pub api_version: String,
    pub state_path: Option<PathBuf>,
    pub timeouts: ResourceTimeouts,
    pub output_json: bool,
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            resource_manager_endpoint: DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            state_path: None,
            timeouts: ResourceTimeouts::default(),
            output_json: false,
            no_color: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.resource_manager_endpoint).map_err(|e| {
            LalinkError::config(format!(
                "Invalid resource manager endpoint '{}': {}",
                self.resource_manager_endpoint, e
            ))
        })?;

        if self.api_version.is_empty() {
            return Err(LalinkError::config("api_version must not be empty"));
        }

        let timeouts = [
            ("create", self.timeouts.create),
            ("read", self.timeouts.read),
            ("update", self.timeouts.update),
            ("delete", self.timeouts.delete),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(LalinkError::config(format!(
                "The {} timeout must be greater than zero",
                name
            )));
        }

        Ok(())
    }

    fn config_dir() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| LalinkError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("lalink"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| LalinkError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("lalink"))
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("lalink.toml"))
    }

    /// Where the local resource state lives
    pub fn resolve_state_path(&self) -> Result<PathBuf> {
        match &self.state_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("state.json")),
        }
    }
}

/// Load configuration with priority order:
/// 1. Command-line flags (applied by the caller)
/// 2. Environment variables
/// 3. Configuration file
/// 4. Default values
pub async fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = Config::get_config_path()?;
    if config_path.exists() {
        config = load_from_file(&config_path).await?;
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config.validate()?;

    Ok(config)
}

pub async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;

    // Try to parse as TOML first, then JSON as fallback
    match toml::from_str::<Config>(&contents) {
        Ok(config) => Ok(config),
        Err(toml_error) => serde_json::from_str::<Config>(&contents).map_err(|_| toml_error.into()),
    }
}

fn parse_secs(value: Option<String>) -> Option<u64> {
    value.and_then(|v| v.trim().parse::<u64>().ok())
}

/// Apply environment overrides using `lookup` to read variables
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = lookup("AZURE_TENANT_ID") {
        config.tenant_id = value;
    }

    if let Some(value) = lookup("AZURE_CLIENT_ID") {
        config.client_id = value;
    }

    if let Some(value) = lookup("AZURE_CLIENT_SECRET") {
        config.client_secret = value;
    }

    if let Some(value) = lookup("ARM_ENDPOINT") {
        config.resource_manager_endpoint = value.trim_end_matches('/').to_string();
    }

    if let Some(value) = lookup("LALINK_STATE_PATH") {
        config.state_path = Some(PathBuf::from(value));
    }

    if let Some(secs) = parse_secs(lookup("LALINK_TIMEOUT_CREATE")) {
        config.timeouts.create = secs;
    }

    if let Some(secs) = parse_secs(lookup("LALINK_TIMEOUT_READ")) {
        config.timeouts.read = secs;
    }

    if let Some(secs) = parse_secs(lookup("LALINK_TIMEOUT_UPDATE")) {
        config.timeouts.update = secs;
    }

    if let Some(secs) = parse_secs(lookup("LALINK_TIMEOUT_DELETE")) {
        config.timeouts.delete = secs;
    }
}
