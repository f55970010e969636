//! Configuration loading and validation.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Smallest receive buffer that can hold a bare IPv4 header.
const MIN_RECEIVE_BUFFER: usize = 20;
/// Largest IP datagram.
const MAX_RECEIVE_BUFFER: usize = 65_535;

/// Main configuration for the ipmon capture service.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Local addresses to capture on. Empty means discover every eligible
    /// interface address.
    #[serde(default)]
    pub addresses: Vec<Ipv4Addr>,

    /// Size in bytes of each receive buffer.
    #[serde(default = "default_receive_buffer_size")]
    pub receive_buffer_size: usize,

    /// Receive buffers kept per session.
    #[serde(default = "default_buffer_pool_size")]
    pub buffer_pool_size: usize,

    /// Capacity of the broadcast channel carrying capture events.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// How long stopping a session may wait for its receive cycle.
    #[serde(default = "default_close_timeout_ms")]
    pub close_timeout_ms: u64,

    /// Interface name prefixes treated as virtual adapters and skipped
    /// during discovery.
    #[serde(default = "default_virtual_adapter_prefixes")]
    pub virtual_adapter_prefixes: Vec<String>,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Prometheus exporter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Address the `/metrics` HTTP listener binds to.
    #[serde(
        default = "default_metrics_listen",
        deserialize_with = "deserialize_socket_addr"
    )]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            receive_buffer_size: default_receive_buffer_size(),
            buffer_pool_size: default_buffer_pool_size(),
            channel_capacity: default_channel_capacity(),
            close_timeout_ms: default_close_timeout_ms(),
            virtual_adapter_prefixes: default_virtual_adapter_prefixes(),
            metrics: MetricsConfig::default(),
        }
    }
}

const fn default_receive_buffer_size() -> usize {
    0x4000
}

const fn default_buffer_pool_size() -> usize {
    8
}

const fn default_channel_capacity() -> usize {
    1024
}

const fn default_close_timeout_ms() -> u64 {
    500
}

const fn default_metrics_listen() -> SocketAddr {
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 9000)
}

pub(crate) fn default_virtual_adapter_prefixes() -> Vec<String> {
    ["vEthernet", "veth", "docker", "br-", "virbr"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> std::result::Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub const fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if !(MIN_RECEIVE_BUFFER..=MAX_RECEIVE_BUFFER).contains(&self.receive_buffer_size) {
            return Err(ConfigError::Validation(format!(
                "receive_buffer_size must be within {MIN_RECEIVE_BUFFER}..={MAX_RECEIVE_BUFFER}"
            ))
            .into());
        }

        if self.buffer_pool_size == 0 {
            return Err(ConfigError::Validation("buffer_pool_size must be > 0".into()).into());
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::Validation("channel_capacity must be > 0".into()).into());
        }

        if self.close_timeout_ms == 0 {
            return Err(ConfigError::Validation("close_timeout_ms must be > 0".into()).into());
        }

        if self.virtual_adapter_prefixes.iter().any(String::is_empty) {
            return Err(
                ConfigError::Validation("empty virtual adapter prefix".into()).into(),
            );
        }

        for address in &self.addresses {
            if address.is_unspecified() {
                return Err(ConfigError::Validation(format!(
                    "cannot capture on unspecified address {address}"
                ))
                .into());
            }
        }

        Ok(())
    }
}
