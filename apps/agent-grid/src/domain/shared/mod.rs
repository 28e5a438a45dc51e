//! Shared Domain Types
//!
//! Value objects used by every agent.

mod identifiers;
mod symbol;
mod timestamp;

pub use identifiers::{AgentAddress, AlertId, TaskId};
pub use symbol::Symbol;
pub use timestamp::Timestamp;
