//! Lifecycle archiver: moves terminal tasks from the queue into the store.
//!
//! The queue publishes one [`QueueEvent`] per terminal transition; this is
//! the single consumer that turns each event into an append-only
//! [`TaskRecord`] insert.  Together with the queue-side removal this keeps
//! the identity invariant: a task id is never live and archived at once.

use std::sync::Arc;

use atelier_queue::{QueueEvent, TaskOutcome};
use chrono::Utc;
use tracing::{error, info};

use crate::db::sqlite::SqliteStore;
use crate::db::{TaskRecord, TaskStore};

/// Drain the terminal-event channel until the queue side shuts down.
///
/// Insert failures are logged and skipped; a lost archive record must not
/// stop the archiver for every later task.
pub async fn run(store: Arc<SqliteStore>, events: flume::Receiver<QueueEvent>) {
    while let Ok(event) = events.recv_async().await {
        let task_id = event.task.task_id.clone();
        if let Err(e) = archive_event(store.as_ref(), event).await {
            error!(task_id = %task_id, error = %e, "failed to archive terminal task");
        }
    }
    info!("terminal-event channel closed; archiver stopped");
}

/// Persist one terminal event as a task record.
pub async fn archive_event(store: &SqliteStore, event: QueueEvent) -> Result<(), sqlx::Error> {
    let status = event.outcome.status().to_string();
    let (result_paths, error_msg) = match event.outcome {
        TaskOutcome::Finished { result_paths } => (result_paths, None),
        TaskOutcome::Failed { error } => (Vec::new(), Some(error)),
        TaskOutcome::Cancelled => (Vec::new(), None),
    };

    store
        .insert_task(TaskRecord {
            task_id: event.task.task_id,
            status,
            req_params: event.task.req_params.to_string(),
            result_paths,
            error_msg,
            in_queue_ms: event.task.in_queue_ms,
            archived_at: Utc::now(),
        })
        .await
}

// ── Tests ──────────────────────────────────────────────────────────────────────
