//! Executor Integration Tests
//!
//! Drives a real executor runtime over the bus with the simulated routines
//! and a paused clock.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use agent_grid::application::messages::TaskStatusRequest;
use agent_grid::application::status::AgentStatus;
use agent_grid::infrastructure::routines::{
    RoutineLatencies, STAKE_GAS, SWAP_GAS, TRADE_GAS, simulated_registry,
};
use agent_grid::{
    AgentAddress, AgentMessage, AgentRuntime, Client, ExecutionTask, ExecutorAgent,
    ExecutorConfig, MessageBus, SharedMessageBus, TaskId, TaskResult, TaskStatus, TaskType,
    TaskUpdate,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(60);

// =============================================================================
// Harness
// =============================================================================

struct Grid {
    client: Client,
    cancel: CancellationToken,
    handle: JoinHandle<ExecutorAgent>,
}

fn spawn_executor(
    bus: &SharedMessageBus,
    config: ExecutorConfig,
) -> (CancellationToken, JoinHandle<ExecutorAgent>) {
    let status = AgentStatus::shared(AgentAddress::executor());
    let executor = ExecutorAgent::new(
        config,
        simulated_registry(RoutineLatencies::default()),
        status.clone(),
    );
    let cancel = CancellationToken::new();
    let handle = AgentRuntime::with_status(executor, bus, status)
        .unwrap()
        .spawn(cancel.clone());
    (cancel, handle)
}

fn start(config: ExecutorConfig) -> Grid {
    let bus = MessageBus::shared(64);
    let (cancel, handle) = spawn_executor(&bus, config);
    let client = Client::connect(bus, AgentAddress::new("client")).unwrap();
    Grid {
        client,
        cancel,
        handle,
    }
}

async fn next_result(client: &mut Client) -> TaskResult {
    match client
        .recv_matching(WAIT, |m| matches!(m, AgentMessage::TaskResult(_)))
        .await
        .unwrap()
    {
        AgentMessage::TaskResult(result) => result,
        other => panic!("expected task result, got {}", other.kind()),
    }
}

async fn next_update(client: &mut Client) -> TaskUpdate {
    match client
        .recv_matching(WAIT, |m| matches!(m, AgentMessage::TaskUpdate(_)))
        .await
        .unwrap()
    {
        AgentMessage::TaskUpdate(update) => update,
        other => panic!("expected task update, got {}", other.kind()),
    }
}

async fn status_of(client: &mut Client, task_id: &str) -> TaskUpdate {
    let id = TaskId::new(task_id);
    client
        .send(
            &AgentAddress::executor(),
            TaskStatusRequest {
                task_id: id.clone(),
            },
        )
        .await
        .unwrap();
    let reply = client
        .recv_matching(WAIT, |m| {
            matches!(m, AgentMessage::TaskUpdate(u) if u.task_id == id && u.progress != 0.1)
        })
        .await
        .unwrap();
    let AgentMessage::TaskUpdate(update) = reply else {
        unreachable!()
    };
    update
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn trade_completes_with_gas_and_hash() {
    let mut grid = start(ExecutorConfig::default());
    let executor = AgentAddress::executor();

    let task = ExecutionTask::new("t1", TaskType::Trade, "0xabc")
        .with_parameter("symbol", "BTC")
        .with_parameter("amount", 0.1);
    grid.client.send(&executor, task).await.unwrap();

    let queued = status_of(&mut grid.client, "t1").await;
    assert_eq!(queued.status, TaskStatus::Pending);
    assert_eq!(queued.message, "Task t1 is pending");

    let started = next_update(&mut grid.client).await;
    assert_eq!(started.status, TaskStatus::InProgress);
    assert_eq!(started.message, "Starting trade task");

    let result = next_result(&mut grid.client).await;
    assert_eq!(result.task_id.as_str(), "t1");
    assert_eq!(result.status, TaskStatus::Completed);
    assert_eq!(result.gas_used, Some(TRADE_GAS));
    assert!(result.transaction_hash.is_some());
    let payload = result.result.unwrap();
    assert_eq!(payload["symbol"], "BTC");
    assert_eq!(payload["amount"], 0.1);

    let finished = status_of(&mut grid.client, "t1").await;
    assert_eq!(finished.status, TaskStatus::Completed);
    assert_eq!(finished.message, "Task t1 completed with status: completed");

    grid.cancel.cancel();
    let agent = grid.handle.await.unwrap();
    assert_eq!(agent.book().history_len(), 1);
    assert_eq!(agent.book().active_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn higher_priority_starts_first() {
    let mut grid = start(ExecutorConfig {
        drain_interval: Duration::from_secs(5),
        batch_size: 1,
    });
    let executor = AgentAddress::executor();

    for (id, priority) in [("low", 0), ("high", 5), ("mid", 2)] {
        let task = ExecutionTask::new(id, TaskType::Trade, "0xabc").with_priority(priority);
        grid.client.send(&executor, task).await.unwrap();
    }

    let mut order = Vec::new();
    for _ in 0..3 {
        order.push(next_update(&mut grid.client).await.task_id.to_string());
    }
    assert_eq!(order, ["high", "mid", "low"]);

    for _ in 0..3 {
        assert_eq!(next_result(&mut grid.client).await.status, TaskStatus::Completed);
    }

    grid.cancel.cancel();
    grid.handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unsupported_task_type_fails() {
    let mut grid = start(ExecutorConfig::default());

    grid.client
        .send(
            &AgentAddress::executor(),
            ExecutionTask::new("b1", TaskType::Bridge, "0xabc"),
        )
        .await
        .unwrap();

    let result = next_result(&mut grid.client).await;
    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("Unsupported task type: bridge"));
    assert!(result.transaction_hash.is_none());

    let status = status_of(&mut grid.client, "b1").await;
    assert_eq!(status.status, TaskStatus::Failed);
    assert!(status.progress.abs() < f64::EPSILON);

    grid.cancel.cancel();
    grid.handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn duplicate_submission_is_rejected() {
    let mut grid = start(ExecutorConfig::default());
    let executor = AgentAddress::executor();

    grid.client
        .send(&executor, ExecutionTask::new("dup", TaskType::Stake, "0xabc"))
        .await
        .unwrap();
    grid.client
        .send(&executor, ExecutionTask::new("dup", TaskType::Swap, "0xabc"))
        .await
        .unwrap();

    let rejected = next_result(&mut grid.client).await;
    assert_eq!(rejected.status, TaskStatus::Failed);
    assert!(rejected.error.unwrap().starts_with("duplicate task id dup"));

    let original = next_result(&mut grid.client).await;
    assert_eq!(original.status, TaskStatus::Completed);
    assert_eq!(original.gas_used, Some(50_000));

    grid.cancel.cancel();
    let agent = grid.handle.await.unwrap();
    assert_eq!(agent.book().history_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_task_is_not_found() {
    let mut grid = start(ExecutorConfig::default());

    let update = status_of(&mut grid.client, "ghost").await;
    assert_eq!(update.status, TaskStatus::Pending);
    assert_eq!(update.message, "Task ghost not found");

    grid.cancel.cancel();
    grid.handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn concurrent_batch_merges_every_result() {
    let mut grid = start(ExecutorConfig {
        drain_interval: Duration::from_secs(5),
        batch_size: 3,
    });
    let executor = AgentAddress::executor();

    for (id, task_type) in [
        ("trade", TaskType::Trade),
        ("stake", TaskType::Stake),
        ("swap", TaskType::Swap),
    ] {
        grid.client
            .send(&executor, ExecutionTask::new(id, task_type, "0xabc"))
            .await
            .unwrap();
    }

    // One drain starts all three; they finish in latency order.
    let mut finished = Vec::new();
    for _ in 0..3 {
        let result = next_result(&mut grid.client).await;
        assert_eq!(result.status, TaskStatus::Completed);
        finished.push((result.task_id.to_string(), result.gas_used));
    }
    assert_eq!(
        finished,
        [
            ("trade".to_string(), Some(TRADE_GAS)),
            ("swap".to_string(), Some(SWAP_GAS)),
            ("stake".to_string(), Some(STAKE_GAS)),
        ]
    );

    for id in ["trade", "stake", "swap"] {
        let update = status_of(&mut grid.client, id).await;
        assert_eq!(update.status, TaskStatus::Completed);
        assert_eq!(update.message, format!("Task {id} completed with status: completed"));
    }

    grid.cancel.cancel();
    let agent = grid.handle.await.unwrap();
    assert_eq!(agent.book().history_len(), 3);
    assert_eq!(agent.book().active_len(), 0);
    assert_eq!(agent.book().pending_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn unread_client_mailbox_does_not_stall_executor() {
    let bus = MessageBus::shared(4);
    let (cancel, handle) = spawn_executor(&bus, ExecutorConfig::default());
    let lazy = Client::connect(bus.clone(), AgentAddress::new("lazy")).unwrap();
    let mut other = Client::connect(bus, AgentAddress::new("other")).unwrap();

    // Six tasks produce twelve replies for a mailbox that holds four.
    for i in 0..6 {
        lazy.send(
            &AgentAddress::executor(),
            ExecutionTask::new(format!("t{i}"), TaskType::Trade, "0xabc"),
        )
        .await
        .unwrap();
    }
    tokio::time::sleep(Duration::from_secs(30)).await;

    let update = status_of(&mut other, "t0").await;
    assert_eq!(update.status, TaskStatus::Completed);
    let update = status_of(&mut other, "t5").await;
    assert_eq!(update.status, TaskStatus::Completed);

    cancel.cancel();
    let agent = handle.await.unwrap();
    assert_eq!(agent.book().history_len(), 6);
    assert_eq!(agent.book().pending_len(), 0);
    drop(lazy);
}
