//! Agent Status
//!
//! Shared, lock-light status that agents publish for the health server.
//! Agents keep their real state private; only these counters leave the loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::shared::AgentAddress;

/// Lifecycle of an agent loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Registered, loop not yet entered.
    Starting,
    /// Processing messages.
    Running,
    /// Loop exited.
    Stopped,
}

/// Executor queue sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueDepths {
    /// Tasks waiting for a drain tick.
    pub pending: usize,
    /// Tasks executing.
    pub active: usize,
    /// Recorded results.
    pub history: usize,
}

/// Status published by one agent.
#[derive(Debug)]
pub struct AgentStatus {
    address: AgentAddress,
    state: parking_lot::RwLock<AgentState>,
    started_at: parking_lot::RwLock<Option<DateTime<Utc>>>,
    messages_handled: AtomicU64,
    ticks: AtomicU64,
    pending: AtomicUsize,
    active: AtomicUsize,
    history: AtomicUsize,
}

/// Shared handle to an agent's status.
pub type SharedAgentStatus = Arc<AgentStatus>;

impl AgentStatus {
    /// Create a status in the `Starting` state.
    #[must_use]
    pub const fn new(address: AgentAddress) -> Self {
        Self {
            address,
            state: parking_lot::RwLock::new(AgentState::Starting),
            started_at: parking_lot::RwLock::new(None),
            messages_handled: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            pending: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            history: AtomicUsize::new(0),
        }
    }

    /// Create a shared status.
    #[must_use]
    pub fn shared(address: AgentAddress) -> SharedAgentStatus {
        Arc::new(Self::new(address))
    }

    /// Address of the agent.
    #[must_use]
    pub const fn address(&self) -> &AgentAddress {
        &self.address
    }

    /// Set the lifecycle state.
    pub fn set_state(&self, state: AgentState) {
        *self.state.write() = state;
        if state == AgentState::Running {
            *self.started_at.write() = Some(Utc::now());
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AgentState {
        *self.state.read()
    }

    /// Count one handled message.
    pub fn increment_messages(&self) {
        self.messages_handled.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one timer tick.
    pub fn increment_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Publish executor queue sizes.
    pub fn set_queue_depths(&self, depths: QueueDepths) {
        self.pending.store(depths.pending, Ordering::Relaxed);
        self.active.store(depths.active, Ordering::Relaxed);
        self.history.store(depths.history, Ordering::Relaxed);
    }

    /// Messages handled so far.
    #[must_use]
    pub fn messages_handled(&self) -> u64 {
        self.messages_handled.load(Ordering::Relaxed)
    }

    /// Timer ticks so far.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Last published queue sizes.
    #[must_use]
    pub fn queue_depths(&self) -> QueueDepths {
        QueueDepths {
            pending: self.pending.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            history: self.history.load(Ordering::Relaxed),
        }
    }

    /// Point-in-time copy for serialisation.
    #[must_use]
    pub fn snapshot(&self) -> AgentStatusSnapshot {
        AgentStatusSnapshot {
            address: self.address.clone(),
            state: self.state(),
            started_at: *self.started_at.read(),
            messages_handled: self.messages_handled(),
            ticks: self.ticks(),
            queue: self.queue_depths(),
        }
    }
}

/// Serialisable view of an `AgentStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatusSnapshot {
    /// Agent address.
    pub address: AgentAddress,
    /// Lifecycle state.
    pub state: AgentState,
    /// When the loop started running.
    pub started_at: Option<DateTime<Utc>>,
    /// Messages handled.
    pub messages_handled: u64,
    /// Timer ticks.
    pub ticks: u64,
    /// Queue sizes. Zero for agents without a queue.
    pub queue: QueueDepths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_starting_state() {
        let status = AgentStatus::new(AgentAddress::executor());
        assert_eq!(status.state(), AgentState::Starting);
        assert!(status.snapshot().started_at.is_none());
    }

    #[test]
    fn running_records_start_time() {
        let status = AgentStatus::new(AgentAddress::executor());
        status.set_state(AgentState::Running);
        assert!(status.snapshot().started_at.is_some());
    }

    #[test]
    fn counters_and_depths() {
        let status = AgentStatus::new(AgentAddress::executor());
        status.increment_messages();
        status.increment_messages();
        status.increment_ticks();
        status.set_queue_depths(QueueDepths {
            pending: 4,
            active: 3,
            history: 10,
        });

        let snapshot = status.snapshot();
        assert_eq!(snapshot.messages_handled, 2);
        assert_eq!(snapshot.ticks, 1);
        assert_eq!(snapshot.queue.pending, 4);
        assert_eq!(snapshot.queue.history, 10);
    }
}
