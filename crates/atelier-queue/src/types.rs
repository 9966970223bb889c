use serde::{Deserialize, Serialize};
use thiserror::Error;

/// High-level lifecycle state of a generation task.
///
/// `Queued` and `Running` only ever appear on the in-memory queue side;
/// the remaining states are terminal and only ever appear on archived
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted and waiting in the FIFO queue.
    Queued,
    /// Currently executing on a worker.
    Running,
    /// Completed successfully; output files recorded.
    Finished,
    /// Completed with an error.
    Failed,
    /// Removed before (or while) executing.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` for states that end a task's life on the queue.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Finished | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// A task that has been submitted but has not yet reached a terminal state.
///
/// Position within the pending set is implicit insertion order; the struct
/// itself carries no index so that snapshots stay valid across queue
/// mutations.
#[derive(Debug, Clone)]
pub struct ActiveTask {
    /// Opaque unique identifier, assigned at submission time.
    pub task_id: String,
    /// Milliseconds since the Unix epoch at enqueue time.  Immutable.
    pub in_queue_ms: i64,
    /// The original generation request parameters.  Immutable.
    pub req_params: serde_json::Value,
    /// Either [`TaskStatus::Queued`] or [`TaskStatus::Running`].
    pub status: TaskStatus,
}

impl ActiveTask {
    /// Build a freshly submitted task, stamping `in_queue_ms` from the wall
    /// clock.
    pub fn new(task_id: impl Into<String>, req_params: serde_json::Value) -> Self {
        Self {
            task_id: task_id.into(),
            in_queue_ms: chrono::Utc::now().timestamp_millis(),
            req_params,
            status: TaskStatus::Queued,
        }
    }
}

/// How a task left the queue.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// Generation succeeded; paths are relative to the outputs root.
    Finished { result_paths: Vec<String> },
    /// Generation failed.
    Failed { error: String },
    /// The task was cancelled while queued or running.
    Cancelled,
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Finished { .. } => TaskStatus::Finished,
            TaskOutcome::Failed { .. } => TaskStatus::Failed,
            TaskOutcome::Cancelled => TaskStatus::Cancelled,
        }
    }
}

/// Published on the terminal-event channel when a task leaves the queue.
///
/// `task.status` still holds the last queue-side state (`Queued` or
/// `Running`); the archived status comes from `outcome`.
#[derive(Debug, Clone)]
pub struct QueueEvent {
    pub task: ActiveTask,
    pub outcome: TaskOutcome,
}

/// Errors produced by queue mutations.
#[derive(Debug, Clone, Error)]
pub enum QueueError {
    /// The pending queue is at capacity.
    #[error("queue full (capacity {capacity})")]
    QueueFull { capacity: usize },

    /// The task id is already pending or running.
    #[error("task already queued: {task_id}")]
    DuplicateTask { task_id: String },

    /// The referenced task is neither pending nor running.
    #[error("task not found: {task_id}")]
    TaskNotFound { task_id: String },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            TaskStatus::Queued,
            TaskStatus::Running,
            TaskStatus::Finished,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
        ] {
            let text = s.to_string();
            assert_eq!(text.parse::<TaskStatus>().unwrap(), s);
        }
        assert_eq!(TaskStatus::Queued.to_string(), "queued");
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskStatus::Queued.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Finished.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn outcome_maps_to_status() {
        assert_eq!(
            TaskOutcome::Finished { result_paths: vec![] }.status(),
            TaskStatus::Finished
        );
        assert_eq!(
            TaskOutcome::Failed { error: "boom".into() }.status(),
            TaskStatus::Failed
        );
        assert_eq!(TaskOutcome::Cancelled.status(), TaskStatus::Cancelled);
    }
}
