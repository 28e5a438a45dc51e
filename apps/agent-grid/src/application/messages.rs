//! Agent Messages
//!
//! Every message that travels over the bus, as one tagged enum. On the wire
//! a message is `{"type": "<snake_case kind>", "payload": {...}}`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::market::{Alert, AlertCondition, PriceData, PriceUpdate};
use crate::domain::portfolio::{PortfolioRequest, PortfolioResponse};
use crate::domain::shared::{AgentAddress, AlertId, Symbol, TaskId, Timestamp};
use crate::domain::task::{ExecutionTask, TaskResult, TaskUpdate};

/// Ask the executor where a task is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatusRequest {
    /// Task to look up.
    pub task_id: TaskId,
}

/// Register a standing price alert with the price monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceAlert {
    /// Caller-chosen identifier. Re-using one replaces the earlier alert.
    /// Generated when omitted.
    #[serde(default = "AlertId::generate")]
    pub alert_id: AlertId,
    /// Watched symbol.
    pub symbol: Symbol,
    /// Threshold for `above` and `below`.
    pub target_price: Decimal,
    /// Trigger condition.
    pub condition: AlertCondition,
    /// Wallet address the alert is for.
    pub user_address: String,
}

impl PriceAlert {
    /// Turn the request into a stored alert owned by `owner`.
    #[must_use]
    pub fn into_alert(self, owner: AgentAddress) -> Alert {
        Alert {
            alert_id: self.alert_id,
            symbol: self.symbol,
            target_price: self.target_price,
            condition: self.condition,
            user_address: self.user_address,
            owner,
            created_at: Timestamp::now(),
        }
    }
}

/// Notification that an alert fired. Sent once, to the registering agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertTriggered {
    /// The alert that fired.
    pub alert_id: AlertId,
    /// Its symbol.
    pub symbol: Symbol,
    /// Its condition.
    pub condition: AlertCondition,
    /// Its target price.
    pub target_price: Decimal,
    /// The price that triggered it.
    pub observed_price: Decimal,
    /// The 24h change at trigger time.
    pub observed_change_24h: Decimal,
    /// Wallet address the alert was for.
    pub user_address: String,
    /// When it fired.
    pub timestamp: Timestamp,
}

impl AlertTriggered {
    /// Describe a fired alert against the snapshot that fired it.
    #[must_use]
    pub fn new(alert: &Alert, data: &PriceData) -> Self {
        Self {
            alert_id: alert.alert_id.clone(),
            symbol: alert.symbol.clone(),
            condition: alert.condition,
            target_price: alert.target_price,
            observed_price: data.price,
            observed_change_24h: data.change_24h,
            user_address: alert.user_address.clone(),
            timestamp: Timestamp::now(),
        }
    }
}

/// Ask the price monitor for the latest snapshot of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDataRequest {
    /// Symbol to look up. Case-insensitive.
    pub symbol: Symbol,
}

/// Any message an agent can send or receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AgentMessage {
    /// Task submission, to the executor.
    ExecutionTask(ExecutionTask),
    /// Status query, to the executor.
    TaskStatusRequest(TaskStatusRequest),
    /// Status reply or start notification, from the executor.
    TaskUpdate(TaskUpdate),
    /// Terminal result, from the executor.
    TaskResult(TaskResult),
    /// Alert registration, to the price monitor.
    PriceAlert(PriceAlert),
    /// Alert notification, from the price monitor.
    AlertTriggered(AlertTriggered),
    /// Snapshot query, to the price monitor.
    PriceDataRequest(PriceDataRequest),
    /// Snapshot reply, from the price monitor.
    PriceData(PriceData),
    /// Price push, from the price monitor.
    PriceUpdate(PriceUpdate),
    /// Allocation request, to the portfolio manager.
    PortfolioRequest(PortfolioRequest),
    /// Allocation reply, from the portfolio manager.
    PortfolioResponse(PortfolioResponse),
}

impl AgentMessage {
    /// Wire tag of the message, also used as a metric label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ExecutionTask(_) => "execution_task",
            Self::TaskStatusRequest(_) => "task_status_request",
            Self::TaskUpdate(_) => "task_update",
            Self::TaskResult(_) => "task_result",
            Self::PriceAlert(_) => "price_alert",
            Self::AlertTriggered(_) => "alert_triggered",
            Self::PriceDataRequest(_) => "price_data_request",
            Self::PriceData(_) => "price_data",
            Self::PriceUpdate(_) => "price_update",
            Self::PortfolioRequest(_) => "portfolio_request",
            Self::PortfolioResponse(_) => "portfolio_response",
        }
    }
}

macro_rules! impl_from_payload {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for AgentMessage {
                fn from(payload: $variant) -> Self {
                    Self::$variant(payload)
                }
            }
        )*
    };
}

impl_from_payload!(
    ExecutionTask,
    TaskStatusRequest,
    TaskUpdate,
    TaskResult,
    PriceAlert,
    AlertTriggered,
    PriceDataRequest,
    PriceData,
    PriceUpdate,
    PortfolioRequest,
    PortfolioResponse,
);

/// A message in flight between two addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Who sent it. Replies go here.
    pub sender: AgentAddress,
    /// Who receives it.
    pub recipient: AgentAddress,
    /// The message.
    pub message: AgentMessage,
    /// When it was sent.
    pub sent_at: Timestamp,
}

impl Envelope {
    /// Address a message.
    #[must_use]
    pub fn new(sender: AgentAddress, recipient: AgentAddress, message: AgentMessage) -> Self {
        Self {
            sender,
            recipient,
            message,
            sent_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskType;

    #[test]
    fn wire_format_is_tagged() {
        let message = AgentMessage::from(TaskStatusRequest {
            task_id: TaskId::new("t1"),
        });
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "task_status_request");
        assert_eq!(json["payload"]["task_id"], "t1");
    }

    #[test]
    fn kind_matches_serde_tag() {
        let messages = [
            AgentMessage::from(ExecutionTask::new("t1", TaskType::Trade, "0x")),
            AgentMessage::from(PriceDataRequest {
                symbol: Symbol::new("btc"),
            }),
            AgentMessage::from(PortfolioResponse::error()),
        ];
        for message in messages {
            let json = serde_json::to_value(&message).unwrap();
            assert_eq!(json["type"], message.kind());
        }
    }

    #[test]
    fn alert_without_id_gets_one() {
        let json = r#"{"symbol":"btc","target_price":"50000","condition":"above","user_address":"0xabc"}"#;
        let first: PriceAlert = serde_json::from_str(json).unwrap();
        let second: PriceAlert = serde_json::from_str(json).unwrap();

        assert!(!first.alert_id.as_str().is_empty());
        assert_ne!(first.alert_id, second.alert_id);
        assert_eq!(first.symbol.as_str(), "BTC");
    }

    #[test]
    fn task_submission_parses_from_json() {
        let message: AgentMessage = serde_json::from_str(
            r#"{"type":"execution_task","payload":{"task_id":"t1","task_type":"trade","user_address":"0xabc","parameters":{"symbol":"BTC","amount":0.1}}}"#,
        )
        .unwrap();
        let AgentMessage::ExecutionTask(task) = message else {
            panic!("expected execution task");
        };
        assert_eq!(task.task_type, TaskType::Trade);
        assert_eq!(task.parameters["symbol"], "BTC");
    }

    #[test]
    fn alert_request_becomes_owned_alert() {
        let request = PriceAlert {
            alert_id: AlertId::new("a1"),
            symbol: Symbol::new("eth"),
            target_price: Decimal::from(4000),
            condition: AlertCondition::Above,
            user_address: "0xabc".to_string(),
        };
        let alert = request.into_alert(AgentAddress::new("client"));
        assert_eq!(alert.symbol.as_str(), "ETH");
        assert_eq!(alert.owner.as_str(), "client");
    }
}
