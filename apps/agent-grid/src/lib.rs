#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Agent Grid - Message-Driven Trading Agents
//!
//! Three cooperating agents on an in-process typed message bus: a portfolio
//! manager answering allocation requests, a price monitor refreshing
//! simulated prices and firing alerts, and an executor running simulated
//! on-chain tasks in priority-ordered batches.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Pure types and rules
//!   - `task`: Execution tasks, results and the task book
//!   - `market`: Price snapshots and alerts
//!   - `portfolio`: Risk tables, asset metrics and the optimizer
//!
//! - **Application**: Agents and port definitions
//!   - `agents`: Portfolio manager, price monitor, executor
//!   - `messages`: The `AgentMessage` contract and `Envelope`
//!   - `ports`: Transport, agent, routine and price source interfaces
//!
//! - **Infrastructure**: Adapters and runtime
//!   - `bus`: Bounded mailboxes and the `Client` endpoint
//!   - `runtime`: One `select!` loop per agent
//!   - `routines`, `price_source`: Simulated outside world
//!   - `config`, `telemetry`, `metrics`, `health`: Ambient services
//!
//! # Message Flow
//!
//! ```text
//! Client ──PortfolioRequest──► portfolio_manager ──PortfolioResponse──► Client
//!                                      ▲
//!                                 PriceUpdate
//!                                      │
//! Client ──PriceAlert───────►   price_monitor ──AlertTriggered──► Client
//!
//! Client ──ExecutionTask────►     executor ──TaskUpdate, TaskResult──► Client
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Business types with no runtime dependencies.
pub mod domain;

/// Application layer - Agents, messages and ports.
pub mod application;

/// Infrastructure layer - Bus, runtime and adapters.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::shared::{AgentAddress, AlertId, Symbol, TaskId, Timestamp};
pub use domain::task::{ExecutionTask, TaskResult, TaskStatus, TaskType, TaskUpdate};

// Messages
pub use application::messages::{AgentMessage, Envelope};

// Agents
pub use application::agents::{
    ExecutorAgent, ExecutorConfig, PortfolioManagerAgent, PriceMonitorAgent, PriceMonitorConfig,
};

// Runtime
pub use infrastructure::bus::{Client, ClientError, MessageBus, SharedMessageBus};
pub use infrastructure::runtime::AgentRuntime;

// Infrastructure config
pub use infrastructure::config::{ConfigError, GridConfig};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{
    TelemetryConfig, TelemetryGuard, init_with_config as init_telemetry,
};
