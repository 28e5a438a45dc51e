//! Infrastructure Layer - Adapters and runtime plumbing.
//!
//! This layer contains the message bus and agent runtime, the simulated
//! adapters behind the application ports, and the ambient services
//! (configuration, telemetry, metrics, health).

/// In-process message bus and client endpoint.
pub mod bus;

/// Configuration loaded from the environment.
pub mod config;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Simulated price source.
pub mod price_source;

/// Simulated task routines.
pub mod routines;

/// Per-agent event loop.
pub mod runtime;

/// OpenTelemetry tracing integration.
pub mod telemetry;
