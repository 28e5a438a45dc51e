//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): how the runtime drives an agent
//! - **Driven Ports** (Secondary/Outbound): how agents deliver messages,
//!   execute tasks and sample prices

mod agent_port;
mod price_source_port;
mod routine_port;
mod transport_port;

pub use agent_port::Agent;
pub use price_source_port::PriceSource;
pub use routine_port::{ExecutionError, RoutineOutput, TaskRoutine};
pub use transport_port::{BusError, MessageTransport};
