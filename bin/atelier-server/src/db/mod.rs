//! Database abstraction layer.
//!
//! [`TaskStore`] defines the interface for the durable store of terminal
//! task records.  The default implementation is [`sqlite::SqliteStore`].
//! To swap to another database (Postgres, MySQL, …), implement [`TaskStore`]
//! for your new type and change the concrete type in
//! [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures (stable since Rust
//! 1.75) so no extra `async-trait` crate is required.

pub mod sqlite;

use chrono::{DateTime, Utc};

/// A row in the `tasks` table: one archived (terminal) generation task.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// Opaque unique identifier, assigned at submission time.
    pub task_id: String,
    /// Terminal status: `"finished"`, `"failed"`, or `"cancelled"`.
    pub status: String,
    /// The original generation request parameters as JSON text.
    pub req_params: String,
    /// Output file locations, relative to the outputs root.
    pub result_paths: Vec<String>,
    /// Failure detail; `None` unless `status` is `"failed"`.
    pub error_msg: Option<String>,
    /// Milliseconds since the Unix epoch at enqueue time.  Immutable;
    /// time-range queries and deletes filter on this column.
    pub in_queue_ms: i64,
    /// Timestamp when the archiver wrote the record.
    pub archived_at: DateTime<Utc>,
}

/// Trait for the durable store of terminal task records.
///
/// Writes are append-only (the archiver inserts, nothing updates); reads are
/// either most-recent-first pages or inclusive time ranges; the only removal
/// path is the transactional range delete.
pub trait TaskStore: Send + Sync + 'static {
    /// Persist a newly archived task.
    fn insert_task(
        &self,
        record: TaskRecord,
    ) -> impl std::future::Future<Output = Result<(), sqlx::Error>> + Send;

    /// Retrieve a single record by task id.
    fn get_task(
        &self,
        task_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<TaskRecord>, sqlx::Error>> + Send;

    /// One page of records ordered by descending insertion id (most recent
    /// first).  Pages past the end come back empty.
    fn list_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> impl std::future::Future<Output = Result<Vec<TaskRecord>, sqlx::Error>> + Send;

    /// All records with `start_ms <= in_queue_ms <= end_ms`, inclusive both
    /// ends, unbounded by page size, ordered by `in_queue_ms` ascending.
    fn list_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> impl std::future::Future<Output = Result<Vec<TaskRecord>, sqlx::Error>> + Send;

    /// Delete every record with `start_ms <= in_queue_ms <= end_ms` and
    /// return exactly the deleted set.
    ///
    /// The select and the delete run inside one transaction: a record
    /// inserted concurrently is either reported *and* removed or untouched,
    /// never half of each.
    fn delete_range(
        &self,
        start_ms: i64,
        end_ms: i64,
    ) -> impl std::future::Future<Output = Result<Vec<TaskRecord>, sqlx::Error>> + Send;
}
