//! Task listing, lookup, and range-delete endpoints.
//!
//! One endpoint serves three sections (archived history, currently running,
//! pending ids); `action=delete` turns the same call into a time-range
//! delete and skips the listing entirely.  The two modes are mutually
//! exclusive in a single call.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::query::TaskCategory;
use crate::schemas::task::{TaskDetail, TasksQuery, TasksResponse};
use crate::state::AppState;
use crate::time::TimeRange;

#[derive(OpenApi)]
#[openapi(paths(get_tasks, get_task), components(schemas(TaskDetail, TasksResponse)))]
pub struct TasksApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tasks", get(get_tasks))
        .route("/tasks/{task_id}", get(get_task))
}

/// List tasks by section, or delete a time range of archived records.
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    params(TasksQuery),
    responses(
        (status = 200, description = "Task sections", body = TasksResponse),
        (status = 204, description = "Range delete performed"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn get_tasks(
    State(state): State<Arc<AppState>>,
    Query(q): Query<TasksQuery>,
) -> Result<Response, ServerError> {
    let range = TimeRange::resolve(q.start_at.as_deref(), q.end_at.as_deref());

    let action = q.action.as_deref().map(str::to_ascii_lowercase);
    if action.as_deref() == Some("delete") {
        let deleted = state.index.delete_range(&range).await;
        info!(deleted, "task range delete handled");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let category = TaskCategory::parse(&q.query);
    let sections = state.index.list(category, q.page, q.page_size, &range).await?;
    Ok(Json(TasksResponse::from(sections)).into_response())
}

/// Fetch one task by id, wherever it currently lives.
#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "ID of the task to retrieve")
    ),
    responses(
        (status = 200, description = "Task retrieved", body = TaskDetail),
        (status = 404, description = "Task not found"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskDetail>, ServerError> {
    let view = state
        .index
        .find(&task_id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("task {task_id} not found")))?;
    Ok(Json(TaskDetail::from(view)))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(TaskCategory::parse("ALL"), TaskCategory::All);
        assert_eq!(TaskCategory::parse("History"), TaskCategory::History);
        assert_eq!(TaskCategory::parse("current"), TaskCategory::Current);
        assert_eq!(TaskCategory::parse("pending"), TaskCategory::Pending);
        assert_eq!(TaskCategory::parse("everything"), TaskCategory::Unknown);
    }
}
