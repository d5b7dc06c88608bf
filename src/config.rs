//! Service configuration loaded from YAML.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::ClassifierConfig;
use crate::domain::SuffixMode;
use crate::error::{Error, Result};
use crate::remote::EASYLIST_URL;
use crate::ruleset::MatchConfig;

/// Largest interval whose length in seconds fits in a `u64`.
const MAX_UPDATE_INTERVAL_HOURS: u64 = u64::MAX / 3600;

/// Configuration for the `serve` command.
///
/// Every field has a default, so an empty file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address both listeners bind to
    pub address: IpAddr,
    /// Port for the settings client
    pub client_port: u16,
    /// Port for the kernel enforcement hook
    pub kernel_port: u16,
    /// Filter list to download
    pub list_url: String,
    /// Directory holding the downloaded list and its metadata
    pub cache_dir: PathBuf,
    /// Toggles and manual block list
    pub policy_path: PathBuf,
    /// Parsed rules of the active list
    pub rules_path: PathBuf,
    pub update_interval_hours: u64,
    pub suffix_mode: SuffixMode,
    /// Verdict cache size; 0 disables the cache
    pub cache_capacity: usize,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            client_port: 65432,
            kernel_port: 65433,
            list_url: EASYLIST_URL.to_string(),
            cache_dir: PathBuf::from("./cache"),
            policy_path: PathBuf::from("./policy.json"),
            rules_path: PathBuf::from("./rules.json"),
            update_interval_hours: 24,
            suffix_mode: SuffixMode::Plain,
            cache_capacity: 10_000,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // serde_yaml treats an empty document as unit, not an empty map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.client_port == 0 || self.kernel_port == 0 {
            return Err(Error::Config("ports must be non-zero".to_string()));
        }
        if self.client_port == self.kernel_port {
            return Err(Error::Config(format!(
                "client_port and kernel_port are both {}",
                self.client_port
            )));
        }
        if self.update_interval_hours == 0 {
            return Err(Error::Config("update_interval_hours must be at least 1".to_string()));
        }
        if self.update_interval_hours > MAX_UPDATE_INTERVAL_HOURS {
            return Err(Error::Config(format!(
                "update_interval_hours must be at most {}",
                MAX_UPDATE_INTERVAL_HOURS
            )));
        }
        if self.list_url.trim().is_empty() {
            return Err(Error::Config("list_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn client_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.client_port)
    }

    pub fn kernel_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.kernel_port)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_hours.saturating_mul(3600))
    }

    /// Classifier settings derived from this configuration.
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            match_config: MatchConfig::new(self.suffix_mode),
            ..ClassifierConfig::with_capacity(self.cache_capacity)
        }
    }
}
