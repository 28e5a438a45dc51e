//! Configuration Module
//!
//! Environment-driven settings for the grid binary.

mod settings;

pub use settings::{
    ConfigError, ExecutorSettings, GridConfig, PriceMonitorSettings, ServerSettings,
    TelemetrySettings,
};
