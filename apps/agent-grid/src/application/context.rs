//! Agent Context
//!
//! The handle an agent's handlers use to talk to the rest of the grid.
//!
//! Outbound messages never wait for the recipient. Background work reports
//! back on a separate unbounded completion channel rather than the agent's
//! mailbox, so a finished result is never dropped or stuck behind a full
//! mailbox.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::application::messages::{AgentMessage, Envelope};
use crate::application::ports::{BusError, MessageTransport};
use crate::domain::shared::AgentAddress;

/// Cloneable handle bound to one agent's address.
#[derive(Clone)]
pub struct AgentContext {
    address: AgentAddress,
    transport: Arc<dyn MessageTransport>,
    completions: mpsc::UnboundedSender<AgentMessage>,
}

impl fmt::Debug for AgentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentContext")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl AgentContext {
    /// Bind a context to an address. The returned `Completions` receives
    /// the output of everything started with `spawn`.
    #[must_use]
    pub fn new(address: AgentAddress, transport: Arc<dyn MessageTransport>) -> (Self, Completions) {
        let (tx, rx) = mpsc::unbounded_channel();
        let completions = Completions {
            address: address.clone(),
            receiver: rx,
        };
        let ctx = Self {
            address,
            transport,
            completions: tx,
        };
        (ctx, completions)
    }

    /// The agent's own address.
    #[must_use]
    pub const fn address(&self) -> &AgentAddress {
        &self.address
    }

    /// Send a message from this agent. Fails rather than waits when the
    /// recipient's mailbox is full.
    pub fn send(&self, recipient: &AgentAddress, message: impl Into<AgentMessage>) -> Result<(), BusError> {
        let envelope = Envelope::new(self.address.clone(), recipient.clone(), message.into());
        self.transport.deliver(envelope)
    }

    /// Send a message and log, rather than return, a delivery failure.
    pub fn send_or_warn(&self, recipient: &AgentAddress, message: impl Into<AgentMessage>) {
        let message = message.into();
        let kind = message.kind();
        if let Err(e) = self.send(recipient, message) {
            tracing::warn!(
                agent = %self.address,
                recipient = %recipient,
                kind,
                error = %e,
                "Failed to deliver message"
            );
        }
    }

    /// Run work in the background. Its output comes back through this
    /// agent's `Completions`, with the agent itself as sender.
    pub fn spawn<F>(&self, work: F) -> JoinHandle<()>
    where
        F: Future<Output = AgentMessage> + Send + 'static,
    {
        let completions = self.completions.clone();
        let address = self.address.clone();
        tokio::spawn(async move {
            let message = work.await;
            if completions.send(message).is_err() {
                tracing::warn!(agent = %address, "Agent stopped before background work finished");
            }
        })
    }
}

/// Receiving end of an agent's completion channel.
#[derive(Debug)]
pub struct Completions {
    address: AgentAddress,
    receiver: mpsc::UnboundedReceiver<AgentMessage>,
}

impl Completions {
    /// Wait for the next finished piece of background work, wrapped as an
    /// envelope from the agent to itself.
    pub async fn recv(&mut self) -> Option<Envelope> {
        let message = self.receiver.recv().await?;
        Some(Envelope::new(self.address.clone(), self.address.clone(), message))
    }
}
