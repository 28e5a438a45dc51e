//! Simulated Task Routines
//!
//! Trade, stake and swap routines that sleep to stand in for network
//! latency and return canned payloads. Parameters the caller supplies are
//! echoed back; missing ones take fixed defaults.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::application::ports::{ExecutionError, RoutineOutput, TaskRoutine};
use crate::application::services::RoutineRegistry;
use crate::domain::task::{ExecutionTask, Parameters, TaskType};

/// Gas reported by a completed trade.
pub const TRADE_GAS: u64 = 21_000;

/// Gas reported by a completed stake.
pub const STAKE_GAS: u64 = 50_000;

/// Gas reported by a completed swap.
pub const SWAP_GAS: u64 = 150_000;

/// Canned transaction hash: `0x` followed by bytes `00..=1f` in hex.
#[must_use]
pub fn simulated_tx_hash() -> String {
    let hex: String = (0u8..32).map(|b| format!("{b:02x}")).collect();
    format!("0x{hex}")
}

/// Simulated latency per routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineLatencies {
    /// Trade latency.
    pub trade: Duration,
    /// Stake latency.
    pub stake: Duration,
    /// Swap latency.
    pub swap: Duration,
}

impl Default for RoutineLatencies {
    fn default() -> Self {
        Self {
            trade: Duration::from_millis(2000),
            stake: Duration::from_millis(3000),
            swap: Duration::from_millis(2500),
        }
    }
}

/// Registry with the three simulated routines. `unstake`, `bridge` and
/// `custom` stay unmapped.
#[must_use]
pub fn simulated_registry(latencies: RoutineLatencies) -> RoutineRegistry {
    RoutineRegistry::new()
        .with(Arc::new(TradeRoutine::new(latencies.trade)))
        .with(Arc::new(StakeRoutine::new(latencies.stake)))
        .with(Arc::new(SwapRoutine::new(latencies.swap)))
}

// =============================================================================
// Parameter Helpers
// =============================================================================

fn string_param(task: &ExecutionTask, key: &str, default: &str) -> Result<Value, ExecutionError> {
    match task.parameters.get(key) {
        None | Some(Value::Null) => Ok(Value::from(default)),
        Some(value @ Value::String(_)) => Ok(value.clone()),
        Some(_) => Err(ExecutionError::InvalidParameter {
            key: key.to_string(),
            expected: "string",
        }),
    }
}

fn number_param(task: &ExecutionTask, key: &str, default: Value) -> Result<Value, ExecutionError> {
    match task.parameters.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value @ Value::Number(_)) => Ok(value.clone()),
        Some(_) => Err(ExecutionError::InvalidParameter {
            key: key.to_string(),
            expected: "number",
        }),
    }
}

fn completed(payload: Value, gas_used: u64) -> RoutineOutput {
    let payload: Parameters = match payload {
        Value::Object(map) => map,
        _ => Parameters::new(),
    };
    RoutineOutput {
        payload,
        gas_used,
        transaction_hash: simulated_tx_hash(),
    }
}

// =============================================================================
// Routines
// =============================================================================

/// Simulated trade.
#[derive(Debug, Clone, Copy)]
pub struct TradeRoutine {
    latency: Duration,
}

impl TradeRoutine {
    /// Create with the given latency.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl TaskRoutine for TradeRoutine {
    fn task_type(&self) -> TaskType {
        TaskType::Trade
    }

    async fn execute(&self, task: &ExecutionTask) -> Result<RoutineOutput, ExecutionError> {
        let payload = json!({
            "symbol": string_param(task, "symbol", "BTC")?,
            "amount": number_param(task, "amount", json!(0.1))?,
            "price": number_param(task, "price", json!(45000))?,
            "side": string_param(task, "side", "buy")?,
            "fees": 0.001,
        });

        tokio::time::sleep(self.latency).await;
        Ok(completed(payload, TRADE_GAS))
    }
}

/// Simulated stake.
#[derive(Debug, Clone, Copy)]
pub struct StakeRoutine {
    latency: Duration,
}

impl StakeRoutine {
    /// Create with the given latency.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl TaskRoutine for StakeRoutine {
    fn task_type(&self) -> TaskType {
        TaskType::Stake
    }

    async fn execute(&self, task: &ExecutionTask) -> Result<RoutineOutput, ExecutionError> {
        let payload = json!({
            "validator": string_param(task, "validator", "default")?,
            "amount": number_param(task, "amount", json!(1.0))?,
            "reward_rate": 0.05,
            "unlock_period": 30,
        });

        tokio::time::sleep(self.latency).await;
        Ok(completed(payload, STAKE_GAS))
    }
}

/// Simulated token swap.
#[derive(Debug, Clone, Copy)]
pub struct SwapRoutine {
    latency: Duration,
}

impl SwapRoutine {
    /// Create with the given latency.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl TaskRoutine for SwapRoutine {
    fn task_type(&self) -> TaskType {
        TaskType::Swap
    }

    async fn execute(&self, task: &ExecutionTask) -> Result<RoutineOutput, ExecutionError> {
        let payload = json!({
            "from_token": string_param(task, "from_token", "USDC")?,
            "to_token": string_param(task, "to_token", "ETH")?,
            "amount_in": number_param(task, "amount_in", json!(1000))?,
            "amount_out": number_param(task, "amount_out", json!(0.33))?,
            "slippage": number_param(task, "slippage", json!(0.5))?,
            "route": ["USDC", "WETH", "ETH"],
        });

        tokio::time::sleep(self.latency).await;
        Ok(completed(payload, SWAP_GAS))
    }
}

// =============================================================================
// Tests
// =============================================================================
