//! Price Monitor Agent
//!
//! On every refresh tick, samples a new snapshot for each tracked symbol,
//! fires any alerts the snapshot satisfies, and pushes a `PriceUpdate` to
//! every downstream address.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::context::AgentContext;
use crate::application::messages::{AgentMessage, AlertTriggered, Envelope, PriceAlert, PriceDataRequest};
use crate::application::ports::{Agent, PriceSource};
use crate::domain::market::{AlertBook, PriceSeed, PriceSnapshotBook, seed_table};
use crate::domain::shared::AgentAddress;
use crate::infrastructure::metrics;

/// Price monitor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceMonitorConfig {
    /// Time between refresh ticks.
    pub refresh_interval: Duration,
    /// Addresses that receive every `PriceUpdate`.
    pub downstream: Vec<AgentAddress>,
}

impl Default for PriceMonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            downstream: vec![AgentAddress::portfolio_manager()],
        }
    }
}

/// The price monitor agent.
pub struct PriceMonitorAgent {
    address: AgentAddress,
    config: PriceMonitorConfig,
    seeds: Vec<PriceSeed>,
    source: Arc<dyn PriceSource>,
    snapshots: PriceSnapshotBook,
    alerts: AlertBook,
}

impl std::fmt::Debug for PriceMonitorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceMonitorAgent")
            .field("address", &self.address)
            .field("config", &self.config)
            .field("symbols", &self.seeds.len())
            .field("alerts", &self.alerts.len())
            .finish_non_exhaustive()
    }
}

impl PriceMonitorAgent {
    /// Create a monitor over the default seed table.
    #[must_use]
    pub fn new(config: PriceMonitorConfig, source: Arc<dyn PriceSource>) -> Self {
        Self::with_seeds(config, source, seed_table())
    }

    /// Create a monitor over a custom set of symbols.
    #[must_use]
    pub fn with_seeds(
        config: PriceMonitorConfig,
        source: Arc<dyn PriceSource>,
        seeds: Vec<PriceSeed>,
    ) -> Self {
        Self {
            address: AgentAddress::price_monitor(),
            config,
            seeds,
            source,
            snapshots: PriceSnapshotBook::new(),
            alerts: AlertBook::new(),
        }
    }

    /// Latest snapshots.
    #[must_use]
    pub const fn snapshots(&self) -> &PriceSnapshotBook {
        &self.snapshots
    }

    /// Registered alerts.
    #[must_use]
    pub const fn alerts(&self) -> &AlertBook {
        &self.alerts
    }

    /// Refresh every symbol once.
    pub fn refresh(&mut self, ctx: &AgentContext) {
        for seed in &self.seeds {
            let data = self.source.sample(seed);
            self.snapshots.record(data.clone());
            metrics::record_price_update(data.symbol.as_str());

            for alert in self.alerts.evaluate(&data) {
                metrics::record_alert_triggered(alert.condition.as_str());
                tracing::info!(
                    alert_id = %alert.alert_id,
                    symbol = %alert.symbol,
                    condition = %alert.condition,
                    target = %alert.target_price,
                    price = %data.price,
                    "Price alert triggered"
                );
                ctx.send_or_warn(&alert.owner, AlertTriggered::new(&alert, &data));
            }

            let update = data.to_update();
            for recipient in &self.config.downstream {
                ctx.send_or_warn(recipient, update.clone());
            }
        }

        tracing::debug!(symbols = self.seeds.len(), "Prices refreshed");
    }

    fn register_alert(&mut self, request: PriceAlert, owner: AgentAddress) {
        let alert = request.into_alert(owner);
        tracing::info!(
            alert_id = %alert.alert_id,
            symbol = %alert.symbol,
            condition = %alert.condition,
            target = %alert.target_price,
            owner = %alert.owner,
            "Price alert registered"
        );
        if let Some(previous) = self.alerts.register(alert) {
            tracing::debug!(alert_id = %previous.alert_id, "Replaced existing alert");
        }
    }

    fn reply_price(&self, ctx: &AgentContext, request: &PriceDataRequest, sender: &AgentAddress) {
        match self.snapshots.get(&request.symbol) {
            Some(data) => ctx.send_or_warn(sender, data.clone()),
            None => {
                tracing::warn!(
                    symbol = %request.symbol,
                    requester = %sender,
                    "No price data for symbol"
                );
            }
        }
    }
}

#[async_trait]
impl Agent for PriceMonitorAgent {
    fn address(&self) -> AgentAddress {
        self.address.clone()
    }

    fn interval(&self) -> Option<Duration> {
        Some(self.config.refresh_interval)
    }

    async fn on_start(&mut self, _ctx: &AgentContext) {
        tracing::info!(
            refresh_interval_secs = self.config.refresh_interval.as_secs(),
            symbols = self.seeds.len(),
            "Price monitor started"
        );
    }

    async fn on_interval(&mut self, ctx: &AgentContext) {
        self.refresh(ctx);
    }

    async fn on_message(&mut self, ctx: &AgentContext, envelope: Envelope) {
        let Envelope {
            sender, message, ..
        } = envelope;

        match message {
            AgentMessage::PriceAlert(request) => self.register_alert(request, sender),
            AgentMessage::PriceDataRequest(request) => {
                self.reply_price(ctx, &request, &sender);
            }
            other => {
                tracing::debug!(sender = %sender, kind = other.kind(), "Price monitor ignoring message");
            }
        }
    }
}
