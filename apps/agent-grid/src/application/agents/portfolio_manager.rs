//! Portfolio Manager Agent
//!
//! Answers allocation requests and keeps its asset prices in step with the
//! price monitor's pushes.

use async_trait::async_trait;

use crate::application::context::AgentContext;
use crate::application::messages::{AgentMessage, Envelope};
use crate::application::ports::Agent;
use crate::domain::market::PriceUpdate;
use crate::domain::portfolio::{AssetTable, PortfolioRequest, PortfolioResponse, optimize};
use crate::domain::shared::AgentAddress;

/// The portfolio manager agent.
#[derive(Debug)]
pub struct PortfolioManagerAgent {
    address: AgentAddress,
    assets: AssetTable,
}

impl Default for PortfolioManagerAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl PortfolioManagerAgent {
    /// Create a manager at the well-known `portfolio_manager` address.
    #[must_use]
    pub fn new() -> Self {
        Self {
            address: AgentAddress::portfolio_manager(),
            assets: AssetTable::default(),
        }
    }

    /// Current asset table.
    #[must_use]
    pub const fn assets(&self) -> &AssetTable {
        &self.assets
    }

    fn handle_request(&self, ctx: &AgentContext, request: &PortfolioRequest, sender: &AgentAddress) {
        tracing::info!(
            requester = %sender,
            risk_level = %request.risk_level,
            amount = %request.amount,
            "Portfolio request received"
        );

        let response = optimize(&self.assets, request).unwrap_or_else(|e| {
            tracing::error!(requester = %sender, error = %e, "Portfolio request failed");
            PortfolioResponse::error()
        });

        ctx.send_or_warn(sender, response);
    }

    fn apply_price(&mut self, update: &PriceUpdate) {
        if self.assets.apply_price(&update.symbol, update.price) {
            tracing::debug!(symbol = %update.symbol, price = %update.price, "Asset price updated");
        }
    }
}

#[async_trait]
impl Agent for PortfolioManagerAgent {
    fn address(&self) -> AgentAddress {
        self.address.clone()
    }

    async fn on_message(&mut self, ctx: &AgentContext, envelope: Envelope) {
        let Envelope {
            sender, message, ..
        } = envelope;

        match message {
            AgentMessage::PortfolioRequest(request) => {
                self.handle_request(ctx, &request, &sender);
            }
            AgentMessage::PriceUpdate(update) => self.apply_price(&update),
            other => {
                tracing::debug!(sender = %sender, kind = other.kind(), "Portfolio manager ignoring message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BusError, MessageTransport};
    use crate::domain::shared::{Symbol, Timestamp};
    use parking_lot::Mutex;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[derive(Default)]
    struct Outbox {
        sent: Mutex<Vec<Envelope>>,
    }

    impl MessageTransport for Outbox {
        fn deliver(&self, envelope: Envelope) -> Result<(), BusError> {
            self.sent.lock().push(envelope);
            Ok(())
        }
    }

    fn setup() -> (PortfolioManagerAgent, AgentContext, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::default());
        let (ctx, _) = AgentContext::new(AgentAddress::portfolio_manager(), outbox.clone());
        (PortfolioManagerAgent::new(), ctx, outbox)
    }

    fn from(sender: &str, message: impl Into<AgentMessage>) -> Envelope {
        Envelope::new(
            AgentAddress::new(sender),
            AgentAddress::portfolio_manager(),
            message.into(),
        )
    }

    fn only_response(outbox: &Outbox) -> (AgentAddress, PortfolioResponse) {
        let sent = std::mem::take(&mut *outbox.sent.lock());
        assert_eq!(sent.len(), 1);
        let envelope = sent.into_iter().next().unwrap();
        let AgentMessage::PortfolioResponse(response) = envelope.message else {
            panic!("expected portfolio response");
        };
        (envelope.recipient, response)
    }

    #[tokio::test]
    async fn replies_to_requester() {
        let (mut agent, ctx, outbox) = setup();
        agent
            .on_message(
                &ctx,
                from("client", PortfolioRequest::new("0xabc", "low", dec!(10000))),
            )
            .await;

        let (recipient, response) = only_response(&outbox);
        assert_eq!(recipient.as_str(), "client");
        assert_eq!(response.expected_return, dec!(0.044));
        assert!(!response.is_error());
    }

    #[tokio::test]
    async fn invalid_amount_degrades_to_error_response() {
        let (mut agent, ctx, outbox) = setup();
        agent
            .on_message(
                &ctx,
                from("client", PortfolioRequest::new("0xabc", "low", Decimal::ZERO)),
            )
            .await;

        let (_, response) = only_response(&outbox);
        assert!(response.is_error());
        assert_eq!(response.risk_score, Decimal::ONE);
    }

    #[tokio::test]
    async fn price_updates_overwrite_known_assets_only() {
        let (mut agent, ctx, outbox) = setup();
        let update = |symbol: &str, price| PriceUpdate {
            symbol: Symbol::new(symbol),
            price,
            change_24h: Decimal::ZERO,
            volume_24h: Decimal::ZERO,
            timestamp: Timestamp::now(),
        };

        agent
            .on_message(&ctx, from("price_monitor", update("ETH", dec!(3333))))
            .await;
        agent
            .on_message(&ctx, from("price_monitor", update("DOGE", dec!(1))))
            .await;

        assert_eq!(agent.assets().get(&Symbol::new("ETH")).unwrap().price, dec!(3333));
        assert!(agent.assets().get(&Symbol::new("DOGE")).is_none());
        assert!(outbox.sent.lock().is_empty());
    }
}
