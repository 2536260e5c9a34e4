// file: src/settings.rs
// version: 1.0.0
// guid: 6ea31d79-e2bf-4304-a841-22bf1e595513

//! Tool settings: logging and webhook delivery

use crate::error::{InstallerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub webhook: WebhookSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    /// Directory receiving a timestamped log file, if set
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    #[default]
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebhookSettings {
    /// Request timeout (seconds)
    pub timeout: u64,
    /// Attempts per webhook, counting the first
    pub retries: u32,
    /// Delay between attempts (seconds)
    pub retry_delay: u64,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            directory: None,
        }
    }
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout: 10,
            retries: 3,
            retry_delay: 5,
        }
    }
}

impl WebhookSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

impl Settings {
    /// Load settings from `path`, or the user settings file when not given,
    /// then apply environment overrides
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();

        match path {
            Some(path) => {
                info!("Loading settings from: {}", path.display());
                settings = Self::load_from_file(path).await?;
            }
            None => {
                if let Some(user_settings) = Self::user_settings_path() {
                    if user_settings.exists() {
                        info!("Loading settings from: {}", user_settings.display());
                        settings = Self::load_from_file(&user_settings).await?;
                    }
                }
            }
        }

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        debug!("Final settings: {:?}", settings);
        Ok(settings)
    }

    /// The user settings file path
    pub fn user_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hci-installer").join("settings.toml"))
    }

    async fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            InstallerError::config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            InstallerError::config(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = var("HCI_INSTALLER_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(timeout) = var("HCI_INSTALLER_WEBHOOK_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.webhook.timeout = secs,
                Err(_) => warn!("Ignoring invalid HCI_INSTALLER_WEBHOOK_TIMEOUT: {}", timeout),
            }
        }

        if let Some(retries) = var("HCI_INSTALLER_WEBHOOK_RETRIES") {
            match retries.parse::<u32>() {
                Ok(n) => self.webhook.retries = n,
                Err(_) => warn!("Ignoring invalid HCI_INSTALLER_WEBHOOK_RETRIES: {}", retries),
            }
        }
    }
}
