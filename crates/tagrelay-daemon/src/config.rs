//! Configuration loading and validation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tagrelay_core::{ChannelConfig, DeviceDescriptor};
use tagrelay_hub::ConnectionString;
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub channels: ChannelConfig,
    /// Devices to monitor; one session and one publisher per entry.
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceDescriptor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    /// Name of the IoT hub (the `<name>.azure-devices.net` prefix)
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Milliseconds between telemetry transmissions per device
    #[serde(default = "default_transmit_interval")]
    pub transmit_interval_ms: u64,
    /// Milliseconds to wait after a disconnect before rediscovering
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            transmit_interval_ms: default_transmit_interval(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

fn default_transmit_interval() -> u64 {
    5000
}

fn default_retry_backoff() -> u64 {
    5000
}

impl Config {
    /// Hub credential for one configured device.
    pub fn connection_string(&self, device: &DeviceDescriptor) -> ConnectionString {
        ConnectionString::new(&self.hub.name, &device.name, &device.key)
    }

    /// Reject configurations the daemon cannot usefully run with.
    ///
    /// An empty hub name would otherwise produce a sink posting to
    /// `https://.azure-devices.net/...` and a delivery failure on every
    /// tick.
    pub fn validate(&self) -> Result<()> {
        if self.hub.name.is_empty() {
            anyhow::bail!("no hub name configured ([hub] name)");
        }
        if self.devices.is_empty() {
            anyhow::bail!("no devices configured ([[device]] entries)");
        }
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config {
            hub: HubConfig::default(),
            relay: RelayConfig::default(),
            channels: ChannelConfig::default(),
            devices: Vec::new(),
        })
    }
}

/// Save a template configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        hub: HubConfig {
            name: "<iot hub name>".to_string(),
        },
        relay: RelayConfig::default(),
        channels: ChannelConfig::default(),
        devices: vec![DeviceDescriptor {
            id: "<device id, MAC without colons>".to_string(),
            name: "<iot device name>".to_string(),
            key: "<device shared access key>".to_string(),
        }],
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content)?;
    Ok(())
}
