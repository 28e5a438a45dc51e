//! Prometheus Metrics Module
//!
//! Exposes agent metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Messages**: messages handled per agent and kind
//! - **Tasks**: submissions, terminal results, execution duration, queue depths
//! - **Prices**: price refreshes and triggered alerts
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::domain::task::{TaskStatus, TaskType};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static INIT_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

/// Install the Prometheus recorder. Later calls return the same handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let _guard = INIT_LOCK.lock();
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "agent_grid_messages_handled_total",
        "Total messages handled, by agent and message kind"
    );
    describe_counter!(
        "agent_grid_delivery_failures_total",
        "Total messages that could not be delivered"
    );

    describe_counter!(
        "agent_grid_tasks_submitted_total",
        "Total tasks accepted into the executor queue"
    );
    describe_counter!(
        "agent_grid_tasks_rejected_total",
        "Total task submissions rejected as duplicates"
    );
    describe_counter!(
        "agent_grid_task_results_total",
        "Total terminal task results, by type and status"
    );
    describe_histogram!(
        "agent_grid_task_execution_seconds",
        "Time from leaving the queue to a terminal result"
    );
    describe_gauge!("agent_grid_tasks_pending", "Tasks waiting in the queue");
    describe_gauge!("agent_grid_tasks_active", "Tasks currently executing");

    describe_counter!(
        "agent_grid_price_updates_total",
        "Total price snapshots produced, by symbol"
    );
    describe_counter!(
        "agent_grid_alerts_triggered_total",
        "Total price alerts fired, by condition"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record a message handled by an agent.
pub fn record_message_handled(agent: &str, kind: &'static str) {
    counter!(
        "agent_grid_messages_handled_total",
        "agent" => agent.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record a message that could not be delivered.
pub fn record_delivery_failure(kind: &'static str) {
    counter!("agent_grid_delivery_failures_total", "kind" => kind).increment(1);
}

/// Record a task accepted into the queue.
pub fn record_task_submitted(task_type: TaskType) {
    counter!(
        "agent_grid_tasks_submitted_total",
        "task_type" => task_type.as_str()
    )
    .increment(1);
}

/// Record a rejected duplicate submission.
pub fn record_task_rejected(task_type: TaskType) {
    counter!(
        "agent_grid_tasks_rejected_total",
        "task_type" => task_type.as_str()
    )
    .increment(1);
}

/// Record a terminal result and how long execution took.
pub fn record_task_result(task_type: TaskType, status: TaskStatus, duration: Duration) {
    counter!(
        "agent_grid_task_results_total",
        "task_type" => task_type.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
    histogram!(
        "agent_grid_task_execution_seconds",
        "task_type" => task_type.as_str()
    )
    .record(duration.as_secs_f64());
}

/// Update the executor queue gauges.
pub fn set_task_queue_depths(pending: usize, active: usize) {
    gauge!("agent_grid_tasks_pending").set(pending as f64);
    gauge!("agent_grid_tasks_active").set(active as f64);
}

/// Record a refreshed price snapshot.
pub fn record_price_update(symbol: &str) {
    counter!(
        "agent_grid_price_updates_total",
        "symbol" => symbol.to_string()
    )
    .increment(1);
}

/// Record a fired alert.
pub fn record_alert_triggered(condition: &'static str) {
    counter!(
        "agent_grid_alerts_triggered_total",
        "condition" => condition
    )
    .increment(1);
}

// =============================================================================
// Tests
// =============================================================================
