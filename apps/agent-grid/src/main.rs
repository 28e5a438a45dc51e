//! Agent Grid Binary
//!
//! Starts the portfolio manager, price monitor and executor agents on a
//! shared message bus, plus the health server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin agent-grid
//! ```
//!
//! # Environment Variables
//!
//! - `AGENT_GRID_HEALTH_PORT`: Health check HTTP port (default: 8000)
//! - `AGENT_GRID_MAILBOX_CAPACITY`: Per-agent mailbox size (default: 1024)
//! - `EXECUTOR_DRAIN_INTERVAL_MS`: Executor drain tick (default: 5000)
//! - `EXECUTOR_BATCH_SIZE`: Tasks started per tick (default: 3)
//! - `EXECUTOR_TRADE_LATENCY_MS` / `EXECUTOR_STAKE_LATENCY_MS` /
//!   `EXECUTOR_SWAP_LATENCY_MS`: Simulated routine latency
//! - `PRICE_MONITOR_INTERVAL_SECS`: Price refresh tick (default: 30)
//! - `PRICE_MONITOR_PRICE_JITTER` / `PRICE_MONITOR_CHANGE_JITTER`: Simulated noise
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: agent-grid)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use agent_grid::application::status::AgentStatus;
use agent_grid::infrastructure::health::{HealthServer, HealthServerState};
use agent_grid::infrastructure::price_source::SimulatedPriceSource;
use agent_grid::infrastructure::routines::simulated_registry;
use agent_grid::infrastructure::telemetry::{self, TelemetryConfig};
use agent_grid::{
    AgentAddress, AgentRuntime, ExecutorAgent, GridConfig, MessageBus, PortfolioManagerAgent,
    PriceMonitorAgent, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let config = GridConfig::from_env()?;

    let _telemetry_guard =
        telemetry::init_with_config(TelemetryConfig::from(config.telemetry.clone()))?;

    tracing::info!("Starting Agent Grid");

    let _metrics_handle = init_metrics()?;

    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let bus = MessageBus::shared(config.server.mailbox_capacity);

    // Portfolio manager
    let portfolio_runtime = AgentRuntime::new(PortfolioManagerAgent::new(), &bus)?;

    // Price monitor
    let price_source = Arc::new(SimulatedPriceSource::new(
        config.price_monitor.price_jitter,
        config.price_monitor.change_jitter,
    ));
    let monitor = PriceMonitorAgent::new(config.price_monitor.monitor_config(), price_source);
    let monitor_runtime = AgentRuntime::new(monitor, &bus)?;

    // Executor
    let executor_status = AgentStatus::shared(AgentAddress::executor());
    let executor = ExecutorAgent::new(
        config.executor.executor_config(),
        simulated_registry(config.executor.latencies()),
        Arc::clone(&executor_status),
    );
    let executor_runtime = AgentRuntime::with_status(executor, &bus, executor_status)?;

    // Health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION"),
        vec![
            portfolio_runtime.status(),
            monitor_runtime.status(),
            executor_runtime.status(),
        ],
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );

    let portfolio_handle = portfolio_runtime.spawn(shutdown_token.child_token());
    let monitor_handle = monitor_runtime.spawn(shutdown_token.child_token());
    let executor_handle = executor_runtime.spawn(shutdown_token.child_token());

    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    tracing::info!(agents = ?bus.addresses(), "Agent grid ready");

    await_shutdown(shutdown_token).await;

    let joined = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let (portfolio, monitor, executor, health) =
            tokio::join!(portfolio_handle, monitor_handle, executor_handle, health_handle);

        if let Ok(executor) = executor {
            let book = executor.book();
            tracing::info!(
                pending = book.pending_len(),
                active = book.active_len(),
                finished = book.history_len(),
                "Executor stopped"
            );
        }
        for (name, failed) in [
            ("portfolio_manager", portfolio.is_err()),
            ("price_monitor", monitor.is_err()),
            ("health", health.is_err()),
        ] {
            if failed {
                tracing::error!(task = name, "Task panicked during shutdown");
            }
        }
    })
    .await;

    if joined.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Shutdown timed out"
        );
    }

    tracing::info!("Agent grid stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &GridConfig) {
    tracing::info!(
        health_port = config.server.health_port,
        mailbox_capacity = config.server.mailbox_capacity,
        drain_interval_ms = config.executor.drain_interval.as_millis() as u64,
        batch_size = config.executor.batch_size,
        refresh_interval_secs = config.price_monitor.refresh_interval.as_secs(),
        otel_enabled = config.telemetry.otel_enabled,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
