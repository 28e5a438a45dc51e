//! Application Layer - Agents, messages and port definitions.
//!
//! This layer contains the three agents, the message contract they share,
//! and the ports through which they reach the runtime and the simulated
//! outside world.

/// The three message-driven agents.
pub mod agents;

/// Handle passed to agent handlers.
pub mod context;

/// Message contract between agents.
pub mod messages;

/// Port interfaces for transport, routines and price sources.
pub mod ports;

/// Application services.
pub mod services;

/// Status published for health reporting.
pub mod status;
