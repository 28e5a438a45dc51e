//! Grid Configuration Settings
//!
//! Loaded from environment variables. Values that fail to parse fall back to
//! their defaults; values that parse but make no sense are rejected.

use std::str::FromStr;
use std::time::Duration;

use crate::application::agents::{ExecutorConfig, PriceMonitorConfig};
use crate::infrastructure::bus::DEFAULT_MAILBOX_CAPACITY;
use crate::infrastructure::price_source::{
    DEFAULT_CHANGE_JITTER, DEFAULT_PRICE_JITTER, MAX_CHANGE_JITTER,
};
use crate::infrastructure::routines::RoutineLatencies;

/// HTTP and bus settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Health and metrics HTTP port.
    pub health_port: u16,
    /// Bounded capacity of each agent mailbox.
    pub mailbox_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            health_port: 8000,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

/// Executor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Time between drain ticks.
    pub drain_interval: Duration,
    /// Tasks started per tick.
    pub batch_size: usize,
    /// Simulated trade latency.
    pub trade_latency: Duration,
    /// Simulated stake latency.
    pub stake_latency: Duration,
    /// Simulated swap latency.
    pub swap_latency: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        let executor = ExecutorConfig::default();
        let latencies = RoutineLatencies::default();
        Self {
            drain_interval: executor.drain_interval,
            batch_size: executor.batch_size,
            trade_latency: latencies.trade,
            stake_latency: latencies.stake,
            swap_latency: latencies.swap,
        }
    }
}

impl ExecutorSettings {
    /// Agent-side view.
    #[must_use]
    pub const fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            drain_interval: self.drain_interval,
            batch_size: self.batch_size,
        }
    }

    /// Routine-side view.
    #[must_use]
    pub const fn latencies(&self) -> RoutineLatencies {
        RoutineLatencies {
            trade: self.trade_latency,
            stake: self.stake_latency,
            swap: self.swap_latency,
        }
    }
}

/// Price monitor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMonitorSettings {
    /// Time between refresh ticks.
    pub refresh_interval: Duration,
    /// Price jitter as a fraction of the seed price.
    pub price_jitter: f64,
    /// 24h change jitter in percentage points.
    pub change_jitter: f64,
}

impl Default for PriceMonitorSettings {
    fn default() -> Self {
        Self {
            refresh_interval: PriceMonitorConfig::default().refresh_interval,
            price_jitter: DEFAULT_PRICE_JITTER,
            change_jitter: DEFAULT_CHANGE_JITTER,
        }
    }
}

impl PriceMonitorSettings {
    /// Agent-side view, pushing updates to the portfolio manager.
    #[must_use]
    pub fn monitor_config(&self) -> PriceMonitorConfig {
        PriceMonitorConfig {
            refresh_interval: self.refresh_interval,
            ..PriceMonitorConfig::default()
        }
    }
}

/// OpenTelemetry export settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySettings {
    /// Export spans over OTLP.
    pub otel_enabled: bool,
    /// OTLP collector endpoint.
    pub otlp_endpoint: String,
    /// Service name reported to the collector.
    pub service_name: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            otel_enabled: false,
            otlp_endpoint: "http://localhost:4318".to_string(),
            service_name: "agent-grid".to_string(),
        }
    }
}

/// Complete grid configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridConfig {
    /// HTTP and bus settings.
    pub server: ServerSettings,
    /// Executor settings.
    pub executor: ExecutorSettings,
    /// Price monitor settings.
    pub price_monitor: PriceMonitorSettings,
    /// Telemetry settings.
    pub telemetry: TelemetrySettings,
}

impl GridConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable parses to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a value parses to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server = ServerSettings {
            health_port: parse_or(&lookup, "AGENT_GRID_HEALTH_PORT", defaults.server.health_port),
            mailbox_capacity: parse_or(
                &lookup,
                "AGENT_GRID_MAILBOX_CAPACITY",
                defaults.server.mailbox_capacity,
            ),
        };

        let executor = ExecutorSettings {
            drain_interval: parse_duration_millis(
                &lookup,
                "EXECUTOR_DRAIN_INTERVAL_MS",
                defaults.executor.drain_interval,
            ),
            batch_size: parse_or(&lookup, "EXECUTOR_BATCH_SIZE", defaults.executor.batch_size),
            trade_latency: parse_duration_millis(
                &lookup,
                "EXECUTOR_TRADE_LATENCY_MS",
                defaults.executor.trade_latency,
            ),
            stake_latency: parse_duration_millis(
                &lookup,
                "EXECUTOR_STAKE_LATENCY_MS",
                defaults.executor.stake_latency,
            ),
            swap_latency: parse_duration_millis(
                &lookup,
                "EXECUTOR_SWAP_LATENCY_MS",
                defaults.executor.swap_latency,
            ),
        };

        let price_monitor = PriceMonitorSettings {
            refresh_interval: parse_duration_secs(
                &lookup,
                "PRICE_MONITOR_INTERVAL_SECS",
                defaults.price_monitor.refresh_interval,
            ),
            price_jitter: parse_or(
                &lookup,
                "PRICE_MONITOR_PRICE_JITTER",
                defaults.price_monitor.price_jitter,
            ),
            change_jitter: parse_or(
                &lookup,
                "PRICE_MONITOR_CHANGE_JITTER",
                defaults.price_monitor.change_jitter,
            ),
        };

        let telemetry = TelemetrySettings {
            otel_enabled: lookup("OTEL_ENABLED").is_some_and(|v| parse_flag(&v)),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.telemetry.otlp_endpoint),
            service_name: lookup("OTEL_SERVICE_NAME")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.telemetry.service_name),
        };

        let config = Self {
            server,
            executor,
            price_monitor,
            telemetry,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.mailbox_capacity == 0 {
            return Err(ConfigError::invalid("AGENT_GRID_MAILBOX_CAPACITY", "must be at least 1"));
        }
        if self.executor.batch_size == 0 {
            return Err(ConfigError::invalid("EXECUTOR_BATCH_SIZE", "must be at least 1"));
        }
        if self.executor.drain_interval.is_zero() {
            return Err(ConfigError::invalid("EXECUTOR_DRAIN_INTERVAL_MS", "must be at least 1"));
        }
        if self.price_monitor.refresh_interval.is_zero() {
            return Err(ConfigError::invalid("PRICE_MONITOR_INTERVAL_SECS", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.price_monitor.price_jitter) {
            return Err(ConfigError::invalid("PRICE_MONITOR_PRICE_JITTER", "must be in [0, 1)"));
        }
        if !(0.0..=MAX_CHANGE_JITTER).contains(&self.price_monitor.change_jitter) {
            return Err(ConfigError::invalid("PRICE_MONITOR_CHANGE_JITTER", "must be in [0, 100]"));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Variable parsed but is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What was wrong.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &str, reason: &str) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_duration_secs<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_duration_millis<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
