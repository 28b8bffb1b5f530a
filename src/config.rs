//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot settings
    #[serde(default)]
    pub bot: BotConfig,

    /// HTTP client behavior settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Remote document locations
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Message delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Representative device per OS family, in notification order
    #[serde(default = "defaults::devices")]
    pub devices: Vec<DeviceTarget>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.bot.token().trim().is_empty() {
            return Err(AppError::validation(
                "bot.token is empty (set it in the config or via TELEGRAM_BOT_TOKEN)",
            ));
        }
        if self.bot.api_base.trim().is_empty() {
            return Err(AppError::validation("bot.api_base is empty"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.notify.max_chunk_len == 0 {
            return Err(AppError::validation("notify.max_chunk_len must be > 0"));
        }
        if self.devices.is_empty() {
            return Err(AppError::validation("No devices defined"));
        }
        for device in &self.devices {
            if device.os.trim().is_empty() || device.identifier.trim().is_empty() {
                return Err(AppError::validation(
                    "Every device needs a non-empty os and identifier",
                ));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            http: HttpConfig::default(),
            sources: SourcesConfig::default(),
            notify: NotifyConfig::default(),
            devices: defaults::devices(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token. Overridable with the TELEGRAM_BOT_TOKEN env var.
    #[serde(default)]
    pub token: String,

    /// Bot API host
    #[serde(default = "defaults::api_base")]
    pub api_base: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: defaults::api_base(),
        }
    }
}

impl BotConfig {
    /// Resolve the bot token, preferring the environment over the file.
    pub fn token(&self) -> String {
        std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_else(|_| self.token.clone())
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Remote document locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Acknowledgements page listing credited reporters by month
    #[serde(default = "defaults::acknowledgements_url")]
    pub acknowledgements_url: String,

    /// Firmware API base; the device identifier is appended
    #[serde(default = "defaults::firmware_api_base")]
    pub firmware_api_base: String,

    /// Index page linking to per-release security notes
    #[serde(default = "defaults::releases_index_url")]
    pub releases_index_url: String,

    /// Link used when no release note could be located
    #[serde(default = "defaults::releases_index_url")]
    pub fallback_release_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            acknowledgements_url: defaults::acknowledgements_url(),
            firmware_api_base: defaults::firmware_api_base(),
            releases_index_url: defaults::releases_index_url(),
            fallback_release_url: defaults::releases_index_url(),
        }
    }
}

/// Message delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Maximum characters per message chunk
    #[serde(default = "defaults::max_chunk_len")]
    pub max_chunk_len: usize,

    /// Pause between chunks of the same recipient, in milliseconds
    #[serde(default = "defaults::chunk_delay_ms")]
    pub chunk_delay_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: defaults::max_chunk_len(),
            chunk_delay_ms: defaults::chunk_delay_ms(),
        }
    }
}

/// One watched OS family and its representative device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceTarget {
    /// OS family label used in notifications (e.g. "iOS")
    pub os: String,

    /// Device identifier understood by the firmware API (e.g. "iPhone16,2")
    pub identifier: String,
}

/// Default configuration values.
mod defaults {
    use super::DeviceTarget;

    pub fn user_agent() -> String {
        format!("secwatch/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn api_base() -> String {
        "https://api.telegram.org".to_string()
    }

    pub fn acknowledgements_url() -> String {
        "https://support.apple.com/en-us/102774".to_string()
    }

    pub fn firmware_api_base() -> String {
        "https://api.ipsw.me/v4/device/".to_string()
    }

    pub fn releases_index_url() -> String {
        "https://support.apple.com/en-us/HT201222".to_string()
    }

    pub fn max_chunk_len() -> usize {
        4000
    }

    pub fn chunk_delay_ms() -> u64 {
        1000
    }

    pub fn devices() -> Vec<DeviceTarget> {
        [
            ("iOS", "iPhone16,2"),
            ("iPadOS", "iPad14,1"),
            ("macOS", "Mac14,6"),
            ("bridgeOS", "iBridge2,15"),
        ]
        .into_iter()
        .map(|(os, identifier)| DeviceTarget {
            os: os.to_string(),
            identifier: identifier.to_string(),
        })
        .collect()
    }
}
