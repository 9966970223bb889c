use atelier_queue::ActiveTask;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::TaskRecord;
use crate::query::{TaskSections, TaskView};

/// Query parameters of `GET /tasks`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct TasksQuery {
    /// Section filter: one of `all`, `history`, `current`, `pending`.
    #[serde(default = "default_category")]
    pub query: String,
    /// Page number for history and pending listings.
    #[serde(default)]
    pub page: u32,
    /// Page size for history and pending listings.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Inclusive lower bound on enqueue time (`YYYY-MM-DDTHH:MM:SS` prefix).
    pub start_at: Option<String>,
    /// Inclusive upper bound on enqueue time; defaults to now.
    pub end_at: Option<String>,
    /// `delete` to remove matching records instead of listing.
    pub action: Option<String>,
}

fn default_category() -> String {
    "all".to_owned()
}

fn default_page_size() -> u32 {
    10
}

/// Unified view of one task, wherever it currently lives.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskDetail {
    pub task_id: String,
    pub status: String,
    #[schema(value_type = Object)]
    pub req_params: serde_json::Value,
    pub result_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    pub in_queue_ms: i64,
    /// RFC 3339; only present once the task has been archived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
}

impl From<TaskRecord> for TaskDetail {
    fn from(r: TaskRecord) -> Self {
        TaskDetail {
            task_id: r.task_id,
            status: r.status,
            // Stored as JSON text; a value that no longer parses is passed
            // through as a plain string rather than dropped.
            req_params: serde_json::from_str(&r.req_params)
                .unwrap_or(serde_json::Value::String(r.req_params)),
            result_paths: r.result_paths,
            error_msg: r.error_msg,
            in_queue_ms: r.in_queue_ms,
            archived_at: Some(r.archived_at.to_rfc3339()),
        }
    }
}

impl From<ActiveTask> for TaskDetail {
    fn from(t: ActiveTask) -> Self {
        TaskDetail {
            task_id: t.task_id,
            status: t.status.to_string(),
            req_params: t.req_params,
            result_paths: Vec::new(),
            error_msg: None,
            in_queue_ms: t.in_queue_ms,
            archived_at: None,
        }
    }
}

impl From<TaskView> for TaskDetail {
    fn from(view: TaskView) -> Self {
        match view {
            TaskView::Active(t) => t.into(),
            TaskView::Archived(r) => r.into(),
        }
    }
}

/// Response body of `GET /tasks`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    pub history: Vec<TaskDetail>,
    pub current: Vec<TaskDetail>,
    pub pending: Vec<String>,
}

impl From<TaskSections> for TasksResponse {
    fn from(sections: TaskSections) -> Self {
        TasksResponse {
            history: sections.history.into_iter().map(TaskDetail::from).collect(),
            current: sections.current.into_iter().map(TaskDetail::from).collect(),
            pending: sections.pending,
        }
    }
}
