//! Configuration management
//!
//! Resolves exporter configuration once at startup, either from the
//! process environment or from a TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::error::ConfigError;
use crate::metrics::{MetricSlot, SlotSet};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub metrics: MetricsConfig,
    pub aws: AwsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Refresh schedule
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between refresh runs
    pub period_secs: u64,
    /// Upper bound for a single cost query, in seconds
    pub timeout_secs: u64,
    /// Delay before the first run, in seconds
    pub startup_delay_secs: u64,
}

impl RefreshConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            period_secs: default_period_secs(),
            timeout_secs: default_timeout_secs(),
            startup_delay_secs: default_startup_delay_secs(),
        }
    }
}

/// Which cost slots to publish
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub cost_last_month: bool,
    pub cost_this_month: bool,
    pub cost_before_last_month: bool,
}

impl MetricsConfig {
    /// Enable flag for a single slot
    pub fn is_enabled(&self, slot: MetricSlot) -> bool {
        match slot {
            MetricSlot::LastMonth => self.cost_last_month,
            MetricSlot::ThisMonth => self.cost_this_month,
            MetricSlot::BeforeLastMonth => self.cost_before_last_month,
        }
    }

    fn set_enabled(&mut self, slot: MetricSlot, enabled: bool) {
        match slot {
            MetricSlot::LastMonth => self.cost_last_month = enabled,
            MetricSlot::ThisMonth => self.cost_this_month = enabled,
            MetricSlot::BeforeLastMonth => self.cost_before_last_month = enabled,
        }
    }

    /// Resolved set of enabled slots
    pub fn enabled_slots(&self) -> SlotSet {
        SlotSet::new(MetricSlot::ALL.into_iter().filter(|s| self.is_enabled(*s)))
    }
}

/// AWS client settings. Credentials come from the SDK default chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the metrics/health listener
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Output format: "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_period_secs() -> u64 { 1800 }
fn default_timeout_secs() -> u64 { 30 }
fn default_startup_delay_secs() -> u64 { 5 }
fn default_region() -> String { "us-west-2".to_string() }
fn default_bind_addr() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 5000)) }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(v) = lookup("QUERY_PERIOD") {
            config.refresh.period_secs = parse_secs("QUERY_PERIOD", &v)?;
        }
        if let Some(v) = lookup("QUERY_TIMEOUT") {
            config.refresh.timeout_secs = parse_secs("QUERY_TIMEOUT", &v)?;
        }

        // Presence alone enables a slot, whatever the value.
        for slot in MetricSlot::ALL {
            config
                .metrics
                .set_enabled(slot, lookup(slot.env_flag()).is_some());
        }

        if let Some(region) = lookup("AWS_REGION") {
            config.aws.region = region;
        }
        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.server.bind_addr = addr.trim().parse().map_err(|_| ConfigError::InvalidAddr {
                key: "LISTEN_ADDR",
                value: addr.clone(),
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh.period_secs == 0 {
            return Err(ConfigError::ZeroInterval("refresh period"));
        }
        if self.refresh.timeout_secs == 0 {
            return Err(ConfigError::ZeroInterval("query timeout"));
        }
        if self.aws.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        match self.logging.format.as_str() {
            "json" | "pretty" => {}
            other => return Err(ConfigError::UnknownLogFormat(other.to_string())),
        }
        EnvFilter::try_new(&self.logging.level).map_err(|e| ConfigError::InvalidLogLevel {
            value: self.logging.level.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}
