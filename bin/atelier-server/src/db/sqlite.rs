//! SQLite implementation of [`TaskStore`].
//!
//! Uses [`sqlx`] with the `sqlite` feature.  Migrations are run automatically
//! on startup via [`SqliteStore::connect`].
//!
//! # Migrations path
//!
//! `sqlx::migrate!("./migrations")` resolves the path **at compile time**
//! relative to `CARGO_MANIFEST_DIR` (the crate root), so the directory is
//! embedded into the binary.  The database file location is determined at
//! runtime by the `ATELIER_DATABASE_URL` environment variable and is **not**
//! related to the current working directory at runtime.
//!
//! # Queries
//!
//! The `sqlx::query` (runtime-verified) form is used deliberately so that no
//! `DATABASE_URL` environment variable is needed at compile time.

use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use super::{TaskRecord, TaskStore};

/// Shape of a `tasks` row as fetched by `sqlx::query_as`.
type TaskRow = (
    String,         // task_id
    String,         // status
    String,         // req_params
    String,         // result_paths (JSON array text)
    Option<String>, // error_msg
    i64,            // in_queue_ms
    String,         // archived_at (RFC 3339 text)
);

const TASK_COLUMNS: &str =
    "task_id, status, req_params, result_paths, error_msg, in_queue_ms, archived_at";

fn from_row(row: TaskRow) -> TaskRecord {
    let (task_id, status, req_params, result_paths, error_msg, in_queue_ms, archived_at) = row;
    TaskRecord {
        result_paths: serde_json::from_str(&result_paths).unwrap_or_else(|e| {
            tracing::warn!(task_id = %task_id, raw = %result_paths, error = %e,
                "failed to parse task result_paths; treating as empty");
            Vec::new()
        }),
        archived_at: archived_at.parse().unwrap_or_else(|e: chrono::ParseError| {
            tracing::warn!(task_id = %task_id, raw = %archived_at, error = %e,
                "failed to parse task archived_at; using now");
            Utc::now()
        }),
        task_id,
        status,
        req_params,
        error_msg,
        in_queue_ms,
    }
}

/// SQLite-backed task record store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g.
    /// `"sqlite://atelier.db?mode=rwc"` or `"sqlite::memory:"` for tests.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        // A pooled `:memory:` URL would open one private database per
        // connection; clamp to a single connection so tests and ephemeral
        // setups all see the same database.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await?
        } else {
            SqlitePool::connect(url).await?
        };
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

impl TaskStore for SqliteStore {
    async fn insert_task(&self, record: TaskRecord) -> Result<(), sqlx::Error> {
        let result_paths = serde_json::to_string(&record.result_paths)
            .unwrap_or_else(|_| "[]".to_owned());
        let archived_at = record.archived_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO tasks (task_id, status, req_params, result_paths, error_msg, in_queue_ms, archived_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.task_id)
        .bind(&record.status)
        .bind(&record.req_params)
        .bind(&result_paths)
        .bind(&record.error_msg)
        .bind(record.in_queue_ms)
        .bind(&archived_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<TaskRecord>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?1"
        ))
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn list_page(&self, page: u32, page_size: u32) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let limit = i64::from(page_size);
        let offset = i64::from(page) * limit;
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY id DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn list_range(&self, start_ms: i64, end_ms: i64) -> Result<Vec<TaskRecord>, sqlx::Error> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE in_queue_ms >= ?1 AND in_queue_ms <= ?2 ORDER BY in_queue_ms ASC"
        ))
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn delete_range(&self, start_ms: i64, end_ms: i64) -> Result<Vec<TaskRecord>, sqlx::Error> {
        // Select and delete under one transaction so the reported set and
        // the removed set are identical even with concurrent inserts.
        let mut tx = self.pool.begin().await?;

        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE in_queue_ms >= ?1 AND in_queue_ms <= ?2 ORDER BY in_queue_ms ASC"
        ))
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE in_queue_ms >= ?1 AND in_queue_ms <= ?2")
            .bind(start_ms)
            .bind(end_ms)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(rows.into_iter().map(from_row).collect())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
