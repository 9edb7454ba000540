//! Configuration
//!
//! Loaded from a TOML file, overridden by `BLNET_` environment variables:
//!
//! ```toml
//! logger = "cmi"
//! address = "192.168.1.20"
//! username = "admin"
//! password = "admin"
//! poll_interval_secs = 120
//! can_nodes = [1, 2]
//! cmi_params = ["I", "O", "La"]
//! ```

use crate::retry::RetryPolicy;
use blnet_codec::cmi::section_name;
use blnet_core::{BlnetError, BlnetResult};
use blnet_transport::serial::DLOGG_BAUD_RATE;
use blnet_transport::tcp::DEFAULT_PORT;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Highest CAN node number
pub const MAX_CAN_NODE: u8 = 62;

/// Kind of device to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoggerKind {
    /// BL-NET over TCP
    #[default]
    BlNet,
    /// D-LOGG over USB serial
    DLogg,
    /// CMI over the HTTP JSON API
    Cmi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlnetConfig {
    pub logger: LoggerKind,
    /// Host name or IP address (BL-NET, CMI); a CMI address may carry a scheme
    pub address: String,
    pub port: u16,
    pub serial_port: String,
    pub baud_rate: u32,
    pub username: Option<String>,
    pub password: Option<String>,
    pub poll_interval_secs: u64,
    /// CAN nodes polled on a CMI
    pub can_nodes: Vec<u8>,
    /// Section codes requested from a CMI
    pub cmi_params: Vec<String>,
    pub max_attempts: u32,
    /// Pause before each command; defaults per logger kind
    pub command_delay_ms: Option<u64>,
    pub io_timeout_secs: u64,
}

impl Default for BlnetConfig {
    fn default() -> Self {
        Self {
            logger: LoggerKind::default(),
            address: String::new(),
            port: DEFAULT_PORT,
            serial_port: String::new(),
            baud_rate: DLOGG_BAUD_RATE,
            username: None,
            password: None,
            poll_interval_secs: 60,
            can_nodes: vec![1],
            cmi_params: vec!["I".to_string(), "O".to_string()],
            max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            command_delay_ms: None,
            io_timeout_secs: 10,
        }
    }
}

impl BlnetConfig {
    /// Load from a TOML file and `BLNET_` environment variables
    ///
    /// A missing file is not an error, the environment alone may configure
    /// everything.
    pub fn load(path: impl AsRef<Path>) -> BlnetResult<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Self::default()))
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed("BLNET_")),
        )
    }

    /// Extract and validate from any figment
    pub fn from_figment(figment: Figment) -> BlnetResult<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| BlnetError::Config(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> BlnetResult<()> {
        match self.logger {
            LoggerKind::BlNet | LoggerKind::Cmi if self.address.trim().is_empty() => {
                return Err(BlnetError::Config("address must not be empty".into()));
            }
            LoggerKind::DLogg if self.serial_port.trim().is_empty() => {
                return Err(BlnetError::Config("serial_port must not be empty".into()));
            }
            _ => {}
        }
        if self.poll_interval_secs == 0 {
            return Err(BlnetError::Config("poll_interval_secs must be positive".into()));
        }
        if self.max_attempts == 0 {
            return Err(BlnetError::Config("max_attempts must be positive".into()));
        }
        if self.logger == LoggerKind::Cmi {
            if self.can_nodes.is_empty() {
                return Err(BlnetError::Config("can_nodes must not be empty".into()));
            }
            if let Some(node) = self
                .can_nodes
                .iter()
                .find(|n| **n == 0 || **n > MAX_CAN_NODE)
            {
                return Err(BlnetError::Config(format!(
                    "CAN node {} out of range 1..={}",
                    node, MAX_CAN_NODE
                )));
            }
            if self.cmi_params.is_empty() {
                return Err(BlnetError::Config("cmi_params must not be empty".into()));
            }
            if let Some(code) = self.cmi_params.iter().find(|c| section_name(c).is_none()) {
                return Err(BlnetError::Config(format!("unknown CMI section code {}", code)));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    pub fn command_delay(&self) -> Duration {
        match (self.command_delay_ms, self.logger) {
            (Some(ms), _) => Duration::from_millis(ms),
            (None, LoggerKind::Cmi) => RetryPolicy::HTTP_COMMAND_DELAY,
            (None, _) => RetryPolicy::STREAM_COMMAND_DELAY,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.command_delay())
    }

    /// CMI base URL; `http://` is assumed when no scheme is given
    pub fn base_url(&self) -> String {
        let address = self.address.trim();
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        }
    }

    /// Human-readable description of the polled device
    pub fn target(&self) -> String {
        match self.logger {
            LoggerKind::BlNet => format!("BL-NET {}:{}", self.address, self.port),
            LoggerKind::DLogg => format!("D-LOGG {}", self.serial_port),
            LoggerKind::Cmi => format!("CMI {} nodes {:?}", self.base_url(), self.can_nodes),
        }
    }
}

/// Builder for [`BlnetConfig`]
///
/// ```rust,no_run
/// use blnet_client::BlnetConfig;
///
/// let config = BlnetConfig::builder()
///     .bl_net("192.168.1.10")
///     .poll_interval_secs(30)
///     .build()?;
/// # Ok::<(), blnet_core::BlnetError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: BlnetConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll a BL-NET at `address` on the default port
    pub fn bl_net(mut self, address: &str) -> Self {
        self.config.logger = LoggerKind::BlNet;
        self.config.address = address.to_string();
        self
    }

    /// Poll a D-LOGG on a serial port
    pub fn d_logg(mut self, serial_port: &str) -> Self {
        self.config.logger = LoggerKind::DLogg;
        self.config.serial_port = serial_port.to_string();
        self
    }

    /// Poll a CMI at `address`
    pub fn cmi(mut self, address: &str) -> Self {
        self.config.logger = LoggerKind::Cmi;
        self.config.address = address.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.config.username = Some(username.to_string());
        self.config.password = Some(password.to_string());
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_secs = secs;
        self
    }

    pub fn can_nodes(mut self, nodes: Vec<u8>) -> Self {
        self.config.can_nodes = nodes;
        self
    }

    pub fn cmi_params(mut self, params: &[&str]) -> Self {
        self.config.cmi_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn command_delay_ms(mut self, ms: u64) -> Self {
        self.config.command_delay_ms = Some(ms);
        self
    }

    pub fn io_timeout_secs(mut self, secs: u64) -> Self {
        self.config.io_timeout_secs = secs;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> BlnetResult<BlnetConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
