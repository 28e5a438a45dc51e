//! Message Transport Port (Driven Port)
//!
//! How an agent's outbound messages reach other mailboxes. Delivery never
//! waits: an agent's handlers share one loop, so a slow recipient must not
//! stall it.

use crate::application::messages::Envelope;
use crate::domain::shared::AgentAddress;

/// Delivery errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// No mailbox is registered under the address.
    #[error("Unknown recipient: {address}")]
    UnknownRecipient {
        /// The unknown address.
        address: AgentAddress,
    },

    /// The recipient's mailbox has been dropped.
    #[error("Mailbox closed: {address}")]
    MailboxClosed {
        /// The closed address.
        address: AgentAddress,
    },

    /// The recipient's mailbox is at capacity. The message was dropped.
    #[error("Mailbox full: {address}")]
    MailboxFull {
        /// The full address.
        address: AgentAddress,
    },

    /// Another mailbox already owns the address.
    #[error("Address already registered: {address}")]
    AlreadyRegistered {
        /// The contested address.
        address: AgentAddress,
    },
}

/// Port for delivering envelopes to their recipient.
pub trait MessageTransport: Send + Sync {
    /// Queue an envelope without waiting. A full mailbox is an error.
    fn deliver(&self, envelope: Envelope) -> Result<(), BusError>;
}
