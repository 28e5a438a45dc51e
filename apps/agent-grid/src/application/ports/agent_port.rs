//! Agent Port (Driver Port)
//!
//! The handler surface an agent registers with the runtime. The runtime
//! calls these one at a time, so an agent's state is only ever touched
//! from its own loop.

use std::time::Duration;

use async_trait::async_trait;

use crate::application::context::AgentContext;
use crate::application::messages::Envelope;
use crate::domain::shared::AgentAddress;

/// A message-driven agent.
#[async_trait]
pub trait Agent: Send + 'static {
    /// Mailbox address the agent receives on.
    fn address(&self) -> AgentAddress;

    /// Period of the `on_interval` timer, if the agent has one.
    fn interval(&self) -> Option<Duration> {
        None
    }

    /// Called once before the first message or tick.
    async fn on_start(&mut self, _ctx: &AgentContext) {}

    /// Called on every timer tick.
    async fn on_interval(&mut self, _ctx: &AgentContext) {}

    /// Called for every message in the mailbox.
    async fn on_message(&mut self, ctx: &AgentContext, envelope: Envelope);
}
