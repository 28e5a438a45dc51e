//! Agent Runtime
//!
//! Drives one agent: a single loop selecting over cancellation, finished
//! background work, the agent's mailbox and its optional interval timer.
//! Handlers run one at a time, so an agent's state never needs a lock.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::application::context::{AgentContext, Completions};
use crate::application::ports::{Agent, BusError};
use crate::application::status::{AgentState, AgentStatus, SharedAgentStatus};
use crate::infrastructure::bus::{Mailbox, SharedMessageBus};
use crate::infrastructure::metrics;

/// A registered agent, ready to run.
#[derive(Debug)]
pub struct AgentRuntime<A: Agent> {
    agent: A,
    mailbox: Mailbox,
    completions: Completions,
    ctx: AgentContext,
    status: SharedAgentStatus,
}

impl<A: Agent> AgentRuntime<A> {
    /// Register the agent's mailbox on the bus.
    pub fn new(agent: A, bus: &SharedMessageBus) -> Result<Self, BusError> {
        let status = Arc::new(AgentStatus::new(agent.address()));
        Self::with_status(agent, bus, status)
    }

    /// Register the agent, publishing into an existing status handle.
    pub fn with_status(
        agent: A,
        bus: &SharedMessageBus,
        status: SharedAgentStatus,
    ) -> Result<Self, BusError> {
        let address = agent.address();
        let mailbox = bus.register(address.clone())?;
        let (ctx, completions) = AgentContext::new(address, bus.clone());
        Ok(Self {
            agent,
            mailbox,
            completions,
            ctx,
            status,
        })
    }

    /// Status handle for health reporting.
    #[must_use]
    pub fn status(&self) -> SharedAgentStatus {
        Arc::clone(&self.status)
    }

    /// Run on a new task until cancelled.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<A> {
        tokio::spawn(self.run(cancel))
    }

    /// Run until cancelled or the mailbox closes. Returns the agent.
    pub async fn run(mut self, cancel: CancellationToken) -> A {
        let address = self.ctx.address().clone();
        let mut ticker = self.agent.interval().map(|period| {
            // First tick after one full period.
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        self.agent.on_start(&self.ctx).await;
        self.status.set_state(AgentState::Running);
        tracing::info!(agent = %address, "Agent running");

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!(agent = %address, "Agent cancelled");
                    break;
                }

                // The context holds a sender, so this never yields `None`.
                Some(envelope) = self.completions.recv() => {
                    metrics::record_message_handled(address.as_str(), envelope.message.kind());
                    self.agent.on_message(&self.ctx, envelope).await;
                }

                envelope = self.mailbox.recv() => {
                    let Some(envelope) = envelope else {
                        tracing::warn!(agent = %address, "Mailbox closed");
                        break;
                    };
                    self.status.increment_messages();
                    metrics::record_message_handled(address.as_str(), envelope.message.kind());
                    self.agent.on_message(&self.ctx, envelope).await;
                }

                _ = async {
                    match ticker.as_mut() {
                        Some(ticker) => ticker.tick().await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.status.increment_ticks();
                    self.agent.on_interval(&self.ctx).await;
                }
            }
        }

        self.status.set_state(AgentState::Stopped);
        self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::messages::{AgentMessage, Envelope, TaskStatusRequest};
    use crate::domain::shared::{AgentAddress, TaskId};
    use crate::infrastructure::bus::{Client, MessageBus};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Echoes status requests back and counts ticks.
    #[derive(Debug, Default)]
    struct Echo {
        ticks: u32,
        period: Option<Duration>,
    }

    #[async_trait]
    impl Agent for Echo {
        fn address(&self) -> AgentAddress {
            AgentAddress::new("echo")
        }

        fn interval(&self) -> Option<Duration> {
            self.period
        }

        async fn on_interval(&mut self, _ctx: &AgentContext) {
            self.ticks += 1;
        }

        async fn on_message(&mut self, ctx: &AgentContext, envelope: Envelope) {
            ctx.send_or_warn(&envelope.sender, envelope.message);
        }
    }

    #[tokio::test]
    async fn handles_messages_until_cancelled() {
        let bus = MessageBus::shared(8);
        let runtime = AgentRuntime::new(Echo::default(), &bus).unwrap();
        let status = runtime.status();
        let cancel = CancellationToken::new();
        let handle = runtime.spawn(cancel.clone());

        let mut client = Client::connect(bus, AgentAddress::new("client")).unwrap();
        let reply = client
            .request(
                &AgentAddress::new("echo"),
                TaskStatusRequest {
                    task_id: TaskId::new("ping"),
                },
                Duration::from_secs(1),
                |m| matches!(m, AgentMessage::TaskStatusRequest(_)),
            )
            .await
            .unwrap();
        assert_eq!(reply.kind(), "task_status_request");
        assert_eq!(status.state(), AgentState::Running);
        assert_eq!(status.messages_handled(), 1);

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(status.state(), AgentState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_ticks_after_each_period() {
        let bus = MessageBus::shared(8);
        let agent = Echo {
            ticks: 0,
            period: Some(Duration::from_secs(5)),
        };
        let cancel = CancellationToken::new();
        let handle = AgentRuntime::new(agent, &bus).unwrap().spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        cancel.cancel();

        let agent = handle.await.unwrap();
        assert_eq!(agent.ticks, 2);
    }

    #[tokio::test]
    async fn duplicate_agent_address_rejected() {
        let bus = MessageBus::shared(8);
        let _first = AgentRuntime::new(Echo::default(), &bus).unwrap();
        assert!(matches!(
            AgentRuntime::new(Echo::default(), &bus),
            Err(BusError::AlreadyRegistered { .. })
        ));
    }
}
