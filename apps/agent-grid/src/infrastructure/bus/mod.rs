//! Message Bus Adapter
//!
//! Routes envelopes to per-address mailboxes built on bounded tokio mpsc
//! channels. Every agent and every external client owns exactly one
//! mailbox.
//!
//! # Architecture
//!
//! ```text
//!  sender ──deliver──► MessageBus ──mpsc──► Mailbox (recipient)
//!                        │
//!                        └── address → Sender<Envelope>
//! ```
//!
//! Agents deliver with `try_send`: a full mailbox drops the envelope and
//! reports `BusError::MailboxFull`. Clients use `send`, which waits for
//! capacity. Only the registry lock is shared; it is never held across an
//! await.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::application::messages::{AgentMessage, Envelope};
use crate::application::ports::{BusError, MessageTransport};
use crate::domain::shared::AgentAddress;
use crate::infrastructure::metrics;

/// Default mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1024;

// =============================================================================
// Message Bus
// =============================================================================

/// Registry of mailboxes, keyed by address.
#[derive(Debug)]
pub struct MessageBus {
    capacity: usize,
    mailboxes: parking_lot::RwLock<HashMap<AgentAddress, mpsc::Sender<Envelope>>>,
}

/// Shared message bus.
pub type SharedMessageBus = Arc<MessageBus>;

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_CAPACITY)
    }
}

impl MessageBus {
    /// Create a bus whose mailboxes hold `capacity` envelopes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            mailboxes: parking_lot::RwLock::new(HashMap::new()),
        }
    }

    /// Create a shared bus.
    #[must_use]
    pub fn shared(capacity: usize) -> SharedMessageBus {
        Arc::new(Self::new(capacity))
    }

    /// Mailbox capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Create the mailbox for an address.
    ///
    /// An address whose previous mailbox was dropped may be registered again.
    pub fn register(&self, address: AgentAddress) -> Result<Mailbox, BusError> {
        let mut mailboxes = self.mailboxes.write();
        if mailboxes.get(&address).is_some_and(|tx| !tx.is_closed()) {
            return Err(BusError::AlreadyRegistered { address });
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        mailboxes.insert(address.clone(), tx);
        tracing::debug!(address = %address, "Mailbox registered");

        Ok(Mailbox {
            address,
            receiver: rx,
        })
    }

    /// Whether an address has a live mailbox.
    #[must_use]
    pub fn is_registered(&self, address: &AgentAddress) -> bool {
        self.mailboxes
            .read()
            .get(address)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// All registered addresses, sorted.
    #[must_use]
    pub fn addresses(&self) -> Vec<AgentAddress> {
        let mut addresses: Vec<_> = self.mailboxes.read().keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Deliver an envelope, waiting for room in the recipient's mailbox.
    pub async fn send(&self, envelope: Envelope) -> Result<(), BusError> {
        let kind = envelope.message.kind();
        let sender = self.sender_for(&envelope.recipient, kind)?;

        sender.send(envelope).await.map_err(|mpsc::error::SendError(envelope)| {
            metrics::record_delivery_failure(kind);
            BusError::MailboxClosed {
                address: envelope.recipient,
            }
        })
    }

    /// Deliver an envelope only if the recipient's mailbox has room.
    pub fn try_send(&self, envelope: Envelope) -> Result<(), BusError> {
        let kind = envelope.message.kind();
        let sender = self.sender_for(&envelope.recipient, kind)?;

        sender.try_send(envelope).map_err(|e| {
            metrics::record_delivery_failure(kind);
            match e {
                TrySendError::Full(envelope) => BusError::MailboxFull {
                    address: envelope.recipient,
                },
                TrySendError::Closed(envelope) => BusError::MailboxClosed {
                    address: envelope.recipient,
                },
            }
        })
    }

    fn sender_for(
        &self,
        recipient: &AgentAddress,
        kind: &'static str,
    ) -> Result<mpsc::Sender<Envelope>, BusError> {
        self.mailboxes.read().get(recipient).cloned().ok_or_else(|| {
            metrics::record_delivery_failure(kind);
            BusError::UnknownRecipient {
                address: recipient.clone(),
            }
        })
    }
}

impl MessageTransport for MessageBus {
    fn deliver(&self, envelope: Envelope) -> Result<(), BusError> {
        self.try_send(envelope)
    }
}

// =============================================================================
// Mailbox
// =============================================================================

/// Receiving end for one address.
#[derive(Debug)]
pub struct Mailbox {
    address: AgentAddress,
    receiver: mpsc::Receiver<Envelope>,
}

impl Mailbox {
    /// Address this mailbox receives for.
    #[must_use]
    pub const fn address(&self) -> &AgentAddress {
        &self.address
    }

    /// Wait for the next envelope. `None` once the bus entry is gone and
    /// the queue is empty.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.receiver.recv().await
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Delivery failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Nothing matching arrived in time.
    #[error("No reply within {after:?}")]
    Timeout {
        /// How long the client waited.
        after: Duration,
    },

    /// The client's mailbox was closed.
    #[error("Client mailbox disconnected")]
    Disconnected,
}

/// A non-agent endpoint on the bus, for the binary and for tests.
///
/// Messages skipped while waiting for a particular reply are kept and
/// returned by later calls, in arrival order.
#[derive(Debug)]
pub struct Client {
    bus: SharedMessageBus,
    mailbox: Mailbox,
    backlog: VecDeque<Envelope>,
}

impl Client {
    /// Register a client mailbox on the bus.
    pub fn connect(bus: SharedMessageBus, address: AgentAddress) -> Result<Self, BusError> {
        let mailbox = bus.register(address)?;
        Ok(Self {
            bus,
            mailbox,
            backlog: VecDeque::new(),
        })
    }

    /// The client's address.
    #[must_use]
    pub const fn address(&self) -> &AgentAddress {
        self.mailbox.address()
    }

    /// Send a message from this client.
    pub async fn send(
        &self,
        recipient: &AgentAddress,
        message: impl Into<AgentMessage>,
    ) -> Result<(), ClientError> {
        let envelope = Envelope::new(self.address().clone(), recipient.clone(), message.into());
        self.bus.send(envelope).await?;
        Ok(())
    }

    /// Receive the next envelope, waiting at most `timeout`.
    pub async fn recv(&mut self, timeout: Duration) -> Result<Envelope, ClientError> {
        if let Some(envelope) = self.backlog.pop_front() {
            return Ok(envelope);
        }
        self.next_from_mailbox(timeout).await
    }

    /// Wait for the first message matching `predicate`.
    pub async fn recv_matching<F>(
        &mut self,
        timeout: Duration,
        mut predicate: F,
    ) -> Result<AgentMessage, ClientError>
    where
        F: FnMut(&AgentMessage) -> bool,
    {
        if let Some(index) = self.backlog.iter().position(|e| predicate(&e.message)) {
            if let Some(envelope) = self.backlog.remove(index) {
                return Ok(envelope.message);
            }
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(ClientError::Timeout { after: timeout });
            }
            let envelope = self.next_from_mailbox(remaining).await.map_err(|e| match e {
                ClientError::Timeout { .. } => ClientError::Timeout { after: timeout },
                other => other,
            })?;
            if predicate(&envelope.message) {
                return Ok(envelope.message);
            }
            self.backlog.push_back(envelope);
        }
    }

    /// Send a message, then wait for the first reply matching `predicate`.
    pub async fn request<F>(
        &mut self,
        recipient: &AgentAddress,
        message: impl Into<AgentMessage>,
        timeout: Duration,
        predicate: F,
    ) -> Result<AgentMessage, ClientError>
    where
        F: FnMut(&AgentMessage) -> bool,
    {
        self.send(recipient, message).await?;
        self.recv_matching(timeout, predicate).await
    }

    /// Envelopes skipped by `recv_matching` and not yet returned.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    async fn next_from_mailbox(&mut self, timeout: Duration) -> Result<Envelope, ClientError> {
        match tokio::time::timeout(timeout, self.mailbox.recv()).await {
            Ok(Some(envelope)) => Ok(envelope),
            Ok(None) => Err(ClientError::Disconnected),
            Err(_) => Err(ClientError::Timeout { after: timeout }),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
