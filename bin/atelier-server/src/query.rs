//! The unified task index: one façade over the durable store and the
//! scheduler's live queue.
//!
//! Tasks live in two places (terminal records in SQLite, everything else in
//! the in-memory queue) and callers should never have to know which.
//! [`TaskIndex`] resolves the split: listings stitch the sections together
//! from one queue snapshot plus one store query, point lookups check the
//! live side first, and range deletion only ever touches the durable side.

use std::sync::Arc;

use atelier_queue::{ActiveTask, TaskQueue};
use tracing::{debug, error, info, warn};

use crate::blob::{BlobStore, FsBlobStore};
use crate::db::sqlite::SqliteStore;
use crate::db::{TaskRecord, TaskStore};
use crate::error::ServerError;
use crate::time::TimeRange;

/// Which sections of a listing the caller asked for.
///
/// Anything unrecognized yields empty sections rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    All,
    History,
    Current,
    Pending,
    Unknown,
}

impl TaskCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "all" => TaskCategory::All,
            "history" => TaskCategory::History,
            "current" => TaskCategory::Current,
            "pending" => TaskCategory::Pending,
            _ => TaskCategory::Unknown,
        }
    }

    fn wants_history(&self) -> bool {
        matches!(self, TaskCategory::All | TaskCategory::History)
    }

    fn wants_current(&self) -> bool {
        matches!(self, TaskCategory::All | TaskCategory::Current)
    }

    fn wants_pending(&self) -> bool {
        matches!(self, TaskCategory::All | TaskCategory::Pending)
    }
}

/// A task resolved by [`TaskIndex::find`], wherever it currently lives.
#[derive(Debug, Clone)]
pub enum TaskView {
    /// Still on the queue (pending or running).
    Active(ActiveTask),
    /// Archived in the durable store.
    Archived(TaskRecord),
}

/// The three sections of a task listing.
#[derive(Debug, Clone, Default)]
pub struct TaskSections {
    pub history: Vec<TaskRecord>,
    pub current: Vec<ActiveTask>,
    pub pending: Vec<String>,
}

/// Query/delete façade over the durable store and the live queue.
///
/// Collaborators are injected at construction; the index itself holds no
/// mutable state and never mutates the queue.
#[derive(Debug, Clone)]
pub struct TaskIndex {
    store: Arc<SqliteStore>,
    queue: TaskQueue,
    outputs: Arc<FsBlobStore>,
}

impl TaskIndex {
    pub fn new(store: Arc<SqliteStore>, queue: TaskQueue, outputs: Arc<FsBlobStore>) -> Self {
        Self {
            store,
            queue,
            outputs,
        }
    }

    /// Assemble the requested listing sections.
    ///
    /// History honours the time-range filter when it is effective (all
    /// matches, unbounded) and falls back to most-recent-first pages
    /// otherwise.  Current and pending both come from a single queue
    /// snapshot, so one response never mixes two queue states.
    pub async fn list(
        &self,
        category: TaskCategory,
        page: u32,
        page_size: u32,
        range: &TimeRange,
    ) -> Result<TaskSections, ServerError> {
        let mut sections = TaskSections::default();

        if category.wants_history() {
            sections.history = match range.effective() {
                Some((start_ms, end_ms)) => self.store.list_range(start_ms, end_ms).await?,
                None => self.store.list_page(page, page_size).await?,
            };
        }

        if category.wants_current() || category.wants_pending() {
            let snapshot = self.queue.snapshot().await;
            if category.wants_current() {
                sections.current = snapshot.current.clone();
            }
            if category.wants_pending() {
                sections.pending = snapshot.pending_page(page as usize, page_size as usize);
            }
        }

        Ok(sections)
    }

    /// Delete every archived record inside the effective range and clean up
    /// its result files.  Returns the number of records removed.
    ///
    /// A degenerate range deletes nothing.  A store failure is logged and
    /// reported as zero tasks affected rather than surfaced; callers of this
    /// API treat deletion as best-effort.
    pub async fn delete_range(&self, range: &TimeRange) -> u64 {
        let Some((start_ms, end_ms)) = range.effective() else {
            debug!("range delete skipped: no effective time range");
            return 0;
        };

        let deleted = match self.store.delete_range(start_ms, end_ms).await {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, start_ms, end_ms,
                    "range delete failed; reporting zero tasks affected");
                return 0;
            }
        };

        // Result files go after the commit: the row delete stays atomic and
        // file removal is pure best-effort.
        for record in &deleted {
            for path in &record.result_paths {
                if let Err(e) = self.outputs.remove(path).await {
                    warn!(task_id = %record.task_id, path = %path, error = %e,
                        "failed to remove result file for deleted task");
                }
            }
        }

        info!(count = deleted.len(), start_ms, end_ms, "task records deleted");
        deleted.len() as u64
    }

    /// Resolve a task id to wherever it currently lives: the live queue
    /// first, then the durable store.
    pub async fn find(&self, task_id: &str) -> Result<Option<TaskView>, ServerError> {
        if let Some(active) = self.queue.find(task_id).await {
            return Ok(Some(TaskView::Active(active)));
        }
        Ok(self.store.get_task(task_id).await?.map(TaskView::Archived))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use atelier_queue::TaskStatus;
    use chrono::Utc;
    use std::path::PathBuf;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("atelier-query-test-{}", uuid::Uuid::new_v4()))
    }

    fn record(task_id: &str, in_queue_ms: i64) -> TaskRecord {
        TaskRecord {
            task_id: task_id.to_owned(),
            status: "finished".to_owned(),
            req_params: format!(r#"{{"prompt":"{task_id}"}}"#),
            result_paths: vec![format!("{task_id}.png")],
            error_msg: None,
            in_queue_ms,
            archived_at: Utc::now(),
        }
    }

    fn active(task_id: &str, in_queue_ms: i64) -> ActiveTask {
        ActiveTask {
            task_id: task_id.to_owned(),
            in_queue_ms,
            req_params: serde_json::json!({ "prompt": task_id }),
            status: TaskStatus::Queued,
        }
    }

    async fn index() -> (TaskIndex, TaskQueue, PathBuf) {
        let store = Arc::new(
            SqliteStore::connect("sqlite::memory:")
                .await
                .expect("in-memory store"),
        );
        // Tests drive the store directly, so the terminal-event receiver is
        // simply dropped.
        let (queue, _events) = TaskQueue::new(64);
        let root = scratch_root();
        let outputs = Arc::new(FsBlobStore::new(&root));
        (
            TaskIndex::new(Arc::clone(&store), queue.clone(), outputs),
            queue,
            root,
        )
    }

    async fn seed_history(idx: &TaskIndex) {
        for (id, ms) in [("h1", 100), ("h2", 200), ("h3", 300)] {
            idx.store.insert_task(record(id, ms)).await.unwrap();
        }
    }

    fn history_ids(sections: &TaskSections) -> Vec<&str> {
        sections.history.iter().map(|r| r.task_id.as_str()).collect()
    }

    #[tokio::test]
    async fn list_all_returns_every_section() {
        let (idx, queue, _root) = index().await;
        seed_history(&idx).await;
        queue.enqueue(active("p1", 400)).await.unwrap();
        queue.enqueue(active("p2", 500)).await.unwrap();
        queue.start_next().await.unwrap();

        let sections = idx
            .list(TaskCategory::All, 0, 10, &TimeRange::default())
            .await
            .unwrap();
        assert_eq!(history_ids(&sections), ["h3", "h2", "h1"]);
        assert_eq!(sections.current.len(), 1);
        assert_eq!(sections.current[0].task_id, "p1");
        assert_eq!(sections.pending, ["p2"]);
    }

    #[tokio::test]
    async fn list_single_categories_fill_only_their_section() {
        let (idx, queue, _root) = index().await;
        seed_history(&idx).await;
        queue.enqueue(active("p1", 400)).await.unwrap();

        let history = idx
            .list(TaskCategory::History, 0, 10, &TimeRange::default())
            .await
            .unwrap();
        assert_eq!(history.history.len(), 3);
        assert!(history.current.is_empty());
        assert!(history.pending.is_empty());

        let pending = idx
            .list(TaskCategory::Pending, 0, 10, &TimeRange::default())
            .await
            .unwrap();
        assert!(pending.history.is_empty());
        assert_eq!(pending.pending, ["p1"]);
    }

    #[tokio::test]
    async fn list_unknown_category_is_all_empty() {
        let (idx, queue, _root) = index().await;
        seed_history(&idx).await;
        queue.enqueue(active("p1", 400)).await.unwrap();

        let sections = idx
            .list(TaskCategory::parse("bogus"), 0, 10, &TimeRange::default())
            .await
            .unwrap();
        assert!(sections.history.is_empty());
        assert!(sections.current.is_empty());
        assert!(sections.pending.is_empty());
    }

    #[tokio::test]
    async fn effective_range_returns_all_matches_unpaged() {
        let (idx, _queue, _root) = index().await;
        seed_history(&idx).await;

        let range = TimeRange {
            start_ms: Some(100),
            end_ms: Some(250),
        };
        // page_size 1 must not truncate a range query.
        let sections = idx.list(TaskCategory::History, 0, 1, &range).await.unwrap();
        assert_eq!(history_ids(&sections), ["h1", "h2"]);
    }

    #[tokio::test]
    async fn degenerate_range_falls_back_to_paging() {
        let (idx, _queue, _root) = index().await;
        seed_history(&idx).await;

        let degenerate = TimeRange {
            start_ms: Some(300),
            end_ms: Some(100),
        };
        let sections = idx
            .list(TaskCategory::History, 0, 2, &degenerate)
            .await
            .unwrap();
        assert_eq!(history_ids(&sections), ["h3", "h2"]);
    }

    #[tokio::test]
    async fn find_prefers_the_live_queue() {
        let (idx, queue, _root) = index().await;
        idx.store.insert_task(record("archived", 100)).await.unwrap();
        queue.enqueue(active("live", 400)).await.unwrap();

        match idx.find("live").await.unwrap() {
            Some(TaskView::Active(t)) => assert_eq!(t.status, TaskStatus::Queued),
            other => panic!("expected active view, got {other:?}"),
        }
        match idx.find("archived").await.unwrap() {
            Some(TaskView::Archived(r)) => assert_eq!(r.in_queue_ms, 100),
            other => panic!("expected archived view, got {other:?}"),
        }
        assert!(idx.find("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_range_removes_records_and_result_files() {
        let (idx, _queue, root) = index().await;
        seed_history(&idx).await;
        tokio::fs::create_dir_all(&root).await.unwrap();
        for name in ["h1.png", "h2.png", "h3.png"] {
            tokio::fs::write(root.join(name), b"png").await.unwrap();
        }

        let range = TimeRange {
            start_ms: Some(100),
            end_ms: Some(250),
        };
        assert_eq!(idx.delete_range(&range).await, 2);

        let remaining = idx
            .list(TaskCategory::History, 0, 10, &TimeRange::default())
            .await
            .unwrap();
        assert_eq!(history_ids(&remaining), ["h3"]);

        assert!(!root.join("h1.png").exists());
        assert!(!root.join("h2.png").exists());
        assert!(root.join("h3.png").exists());

        tokio::fs::remove_dir_all(&root).await.ok();
    }

    #[tokio::test]
    async fn delete_with_degenerate_range_is_a_noop() {
        let (idx, _queue, _root) = index().await;
        seed_history(&idx).await;

        assert_eq!(idx.delete_range(&TimeRange::default()).await, 0);
        let sections = idx
            .list(TaskCategory::History, 0, 10, &TimeRange::default())
            .await
            .unwrap();
        assert_eq!(sections.history.len(), 3);
    }

    #[tokio::test]
    async fn delete_survives_missing_result_files() {
        let (idx, _queue, _root) = index().await;
        seed_history(&idx).await;

        // No files on disk at all: the row delete must still succeed.
        let range = TimeRange {
            start_ms: Some(100),
            end_ms: Some(400),
        };
        assert_eq!(idx.delete_range(&range).await, 3);
    }
}
