// file: src/config/loader.rs
// version: 2.1.0
// guid: d4e5f6a7-b8c9-4123-8567-890123def0a1

//! Configuration loading from files, remote URLs and the kernel command line,
//! with opt-in environment variable substitution for local files

use super::cmdline::parse_cmdline;
use super::HarvesterConfig;
use crate::error::InstallerError;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for fetching a remote configuration document
pub const REMOTE_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration loader. Documents are parsed as written unless
/// substitution is enabled with [`ConfigLoader::with_env_expansion`].
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
    expand_env: bool,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
            expand_env: false,
        }
    }

    /// Substitute `${VAR}` in local files before parsing. Remote documents
    /// are never rewritten.
    pub fn with_env_expansion(mut self) -> Self {
        self.expand_env = true;
        self
    }

    /// Load an installer configuration from a YAML file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<HarvesterConfig> {
        let content = fs::read_to_string(&path).map_err(|e| {
            InstallerError::config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        debug!("Loaded config file {}", path.as_ref().display());
        if self.expand_env {
            let expanded = self.expand_env_vars(&content)?;
            return self.from_yaml_str(&expanded);
        }
        self.from_yaml_str(&content)
    }

    /// Parse an installer configuration from YAML text, as written
    pub fn from_yaml_str(&self, content: &str) -> Result<HarvesterConfig> {
        if content.trim().is_empty() {
            return Ok(HarvesterConfig::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Fetch and parse a remote configuration document
    pub async fn fetch_remote(&self, url: &str) -> Result<HarvesterConfig> {
        info!("Fetching remote config from {}", url);
        let client = reqwest::Client::builder()
            .timeout(REMOTE_FETCH_TIMEOUT)
            .build()?;

        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallerError::network(format!(
                "Failed to fetch config from {}: HTTP {}",
                url, status
            )));
        }
        let body = response.text().await?;
        self.from_yaml_str(&body)
    }

    /// Load a configuration from a path or `http(s)://` URL
    pub async fn load_source(&self, source: &str) -> Result<HarvesterConfig> {
        if is_remote(source) {
            self.fetch_remote(source).await
        } else {
            self.load_file(source)
        }
    }

    /// Assemble the effective configuration.
    ///
    /// Values from the kernel command line take precedence over the document
    /// named by `source`. With no `source`, a `install.configUrl` on the command
    /// line is fetched instead.
    pub async fn load(&self, source: Option<&str>, cmdline: Option<&str>) -> Result<HarvesterConfig> {
        let mut config = match cmdline {
            Some(text) => parse_cmdline(text)?,
            None => HarvesterConfig::default(),
        };

        let base = match source {
            Some(source) => Some(self.load_source(source).await?),
            None if !config.install.config_url.is_empty() => {
                let url = config.install.config_url.clone();
                Some(self.load_source(&url).await?)
            }
            None => None,
        };

        if let Some(base) = base {
            config.merge_from(&base);
        }
        Ok(config)
    }

    /// Expand environment variables in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| InstallerError::config(format!("Invalid regex pattern: {}", e)))?;

        let mut missing_vars = Vec::new();
        let result = re.replace_all(content, |caps: &regex::Captures| {
            match self.env_vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    missing_vars.push(caps[1].to_string());
                    String::new()
                }
            }
        });

        if !missing_vars.is_empty() {
            return Err(InstallerError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result.into_owned())
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env_vars.insert(key.into(), value.into());
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the kernel command line, usually `/proc/cmdline`
pub fn read_cmdline<P: AsRef<Path>>(path: P) -> Result<String> {
    let text = fs::read_to_string(&path).map_err(|e| {
        InstallerError::system(format!(
            "Failed to read kernel command line {}: {}",
            path.as_ref().display(),
            e
        ))
    })?;
    Ok(text.trim().to_string())
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}
