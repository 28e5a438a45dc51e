//! Strongly-typed identifiers for tasks, alerts and agents.
//!
//! These prevent mixing up a task id with an alert id or a mailbox address.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the inner string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(TaskId, "Identifier of an execution task, chosen by the submitter.");
define_id!(AlertId, "Identifier of a price alert, chosen by the registrant.");

impl AlertId {
    /// Fresh identifier (UUID v4) for registrants that do not pick one.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
define_id!(
    AgentAddress,
    "Mailbox address of an agent or client on the message bus."
);

impl AgentAddress {
    /// Address of the portfolio manager agent.
    #[must_use]
    pub fn portfolio_manager() -> Self {
        Self::new("portfolio_manager")
    }

    /// Address of the price monitor agent.
    #[must_use]
    pub fn price_monitor() -> Self {
        Self::new("price_monitor")
    }

    /// Address of the executor agent.
    #[must_use]
    pub fn executor() -> Self {
        Self::new("executor")
    }
}
