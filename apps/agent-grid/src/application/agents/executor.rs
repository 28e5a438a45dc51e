//! Executor Agent
//!
//! Queues submitted tasks and, on every drain tick, starts up to
//! `batch_size` of them, highest priority first.
//!
//! # Task flow
//!
//! ```text
//! ExecutionTask ──► pending ──drain──► active ──routine──► TaskResult
//!                                        │                    │
//!                                        └── TaskUpdate       └──► history ──► submitter
//!                                            (starting)
//! ```
//!
//! Each running task is owned by its execution future. The future reports
//! back on the executor's completion channel, and the executor moves the
//! task from active to history in one step before forwarding the result.
//! Replies to a submitter whose mailbox is full are dropped and logged.

use std::time::Duration;

use async_trait::async_trait;

use crate::application::context::AgentContext;
use crate::application::messages::{AgentMessage, Envelope, TaskStatusRequest};
use crate::application::ports::{Agent, ExecutionError};
use crate::application::services::RoutineRegistry;
use crate::application::status::{QueueDepths, SharedAgentStatus};
use crate::domain::shared::{AgentAddress, Timestamp};
use crate::domain::task::{ExecutionTask, TaskBook, TaskResult, TaskUpdate};
use crate::infrastructure::metrics;

/// Executor scheduling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Time between drain ticks.
    pub drain_interval: Duration,
    /// Maximum tasks started per tick.
    pub batch_size: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(5),
            batch_size: 3,
        }
    }
}

/// The task executor agent.
#[derive(Debug)]
pub struct ExecutorAgent {
    address: AgentAddress,
    config: ExecutorConfig,
    book: TaskBook,
    routines: RoutineRegistry,
    status: SharedAgentStatus,
}

impl ExecutorAgent {
    /// Create an executor at the well-known `executor` address.
    #[must_use]
    pub fn new(config: ExecutorConfig, routines: RoutineRegistry, status: SharedAgentStatus) -> Self {
        Self {
            address: AgentAddress::executor(),
            config,
            book: TaskBook::new(),
            routines,
            status,
        }
    }

    /// Read access to the task book.
    #[must_use]
    pub const fn book(&self) -> &TaskBook {
        &self.book
    }

    fn submit(&mut self, ctx: &AgentContext, task: ExecutionTask, submitter: AgentAddress) {
        let task_id = task.task_id.clone();
        let task_type = task.task_type;

        match self.book.submit(task, submitter.clone()) {
            Ok(()) => {
                metrics::record_task_submitted(task_type);
                tracing::info!(
                    task_id = %task_id,
                    task_type = %task_type,
                    submitter = %submitter,
                    "Task queued"
                );
                self.publish_depths();
            }
            Err(e) => {
                metrics::record_task_rejected(task_type);
                tracing::warn!(task_id = %task_id, error = %e, "Task rejected");
                // Not recorded: the id's existing history entry stays untouched.
                ctx.send_or_warn(&submitter, TaskResult::failed(task_id, e.to_string()));
            }
        }
    }

    fn drain(&mut self, ctx: &AgentContext) {
        let batch = self.book.take_batch(self.config.batch_size);
        if batch.is_empty() {
            return;
        }

        tracing::debug!(
            started = batch.len(),
            remaining = self.book.pending_len(),
            "Draining task queue"
        );

        for queued in batch {
            ctx.send_or_warn(&queued.submitter, TaskUpdate::starting(&queued.task));

            let task_id = queued.task.task_id.clone();
            let execution = self.routines.dispatch(queued.task);

            ctx.spawn(async move {
                // Inner task so a panicking routine still yields a result.
                let result = match tokio::spawn(execution).await {
                    Ok(result) => result,
                    Err(e) => {
                        let error = ExecutionError::Aborted {
                            message: e.to_string(),
                        };
                        tracing::error!(task_id = %task_id, error = %error, "Task execution aborted");
                        TaskResult::failed(task_id, error.to_string())
                    }
                };
                AgentMessage::TaskResult(result)
            });
        }

        self.publish_depths();
    }

    fn complete(&mut self, ctx: &AgentContext, result: TaskResult) {
        match self.book.complete(result) {
            Ok(done) => {
                let elapsed = Timestamp::now()
                    .as_datetime()
                    .signed_duration_since(done.started_at.as_datetime())
                    .to_std()
                    .unwrap_or_default();
                metrics::record_task_result(done.task_type, done.result.status, elapsed);
                tracing::info!(
                    task_id = %done.result.task_id,
                    status = %done.result.status,
                    elapsed_ms = elapsed.as_millis(),
                    "Task finished"
                );
                self.publish_depths();
                ctx.send_or_warn(&done.submitter, done.result);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping task result");
            }
        }
    }

    fn reply_status(&self, ctx: &AgentContext, request: TaskStatusRequest, sender: &AgentAddress) {
        let update = self.book.status(&request.task_id);
        ctx.send_or_warn(sender, update);
    }

    fn publish_depths(&self) {
        let depths = QueueDepths {
            pending: self.book.pending_len(),
            active: self.book.active_len(),
            history: self.book.history_len(),
        };
        self.status.set_queue_depths(depths);
        metrics::set_task_queue_depths(depths.pending, depths.active);
    }
}

#[async_trait]
impl Agent for ExecutorAgent {
    fn address(&self) -> AgentAddress {
        self.address.clone()
    }

    fn interval(&self) -> Option<Duration> {
        Some(self.config.drain_interval)
    }

    async fn on_start(&mut self, _ctx: &AgentContext) {
        tracing::info!(
            drain_interval_ms = self.config.drain_interval.as_millis(),
            batch_size = self.config.batch_size,
            routines = ?self.routines,
            "Executor started"
        );
    }

    async fn on_interval(&mut self, ctx: &AgentContext) {
        self.drain(ctx);
    }

    async fn on_message(&mut self, ctx: &AgentContext, envelope: Envelope) {
        let Envelope {
            sender, message, ..
        } = envelope;

        match message {
            AgentMessage::ExecutionTask(task) => self.submit(ctx, task, sender),
            AgentMessage::TaskStatusRequest(request) => {
                self.reply_status(ctx, request, &sender);
            }
            AgentMessage::TaskResult(result) if &sender == ctx.address() => {
                self.complete(ctx, result);
            }
            other => {
                tracing::debug!(sender = %sender, kind = other.kind(), "Executor ignoring message");
            }
        }
    }
}
