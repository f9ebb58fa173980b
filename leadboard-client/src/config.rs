use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::filter::DEFAULT_PAGE_SIZE;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClientConfig {
    pub api: ApiSettings,
    pub board: BoardSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub auth_token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".to_string(),
            timeout_secs: 15,
            auth_token: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BoardSettings {
    pub page_size: u32,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();
        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Reads `config_path`, writing the defaults there first if the file is
    /// missing. `LEADBOARD__API__BASE_URL` style variables override the file.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            let default_config = toml::to_string_pretty(&ClientConfig::default()).map_err(|e| {
                ConfigError::Message(format!("Failed to serialize default config: {e}"))
            })?;
            std::fs::write(config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.to_path_buf()))
            .add_source(Environment::with_prefix("LEADBOARD").separator("__"))
            .build()?;

        builder.try_deserialize()
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("leadboard").join("client.toml")
    } else {
        PathBuf::from("client.toml")
    }
}

/// Shows the first characters of a token only.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 6 {
        "*".repeat(token.len())
    } else {
        let visible: String = token.chars().take(6).collect();
        let hidden = token.chars().count().saturating_sub(6).min(24);
        format!("{}{}", visible, "*".repeat(hidden))
    }
}
