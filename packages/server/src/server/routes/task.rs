//! Search task endpoints under `/api/v1/task`.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use seeker::{title_from_url, PathRecord, PathStatus};
use serde::{Deserialize, Serialize};

use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Article URL or title to start from
    pub source_url: String,
    /// Article URL or title to reach
    pub dest_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    #[serde(rename = "taskId")]
    pub task_id: String,
}

/// Client view of a search's status record.
#[derive(Debug, Serialize, Deserialize)]
pub struct PathView {
    #[serde(rename = "taskId")]
    pub task_id: String,
    pub source_node: String,
    pub dest_node: String,
    pub status: PathStatus,
    /// Comma-joined node chain, present once found
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trace: String,
}

impl From<PathRecord> for PathView {
    fn from(record: PathRecord) -> Self {
        Self {
            task_id: record.origin_id,
            source_node: record.source_node,
            dest_node: record.dest_node,
            status: record.status,
            trace: record.trace,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetTaskResponse {
    pub path: PathView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTaskResponse {
    /// Subscriptions still holding the search open
    pub remaining: i64,
}

/// Start (or subscribe to) a search between two articles.
pub async fn create_task_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<CreateTaskResponse>)> {
    let source = title_from_url(&request.source_url);
    let dest = title_from_url(&request.dest_url);

    if source.is_empty() || dest.is_empty() {
        return Err(ApiError::BadRequest(
            "source_url and dest_url must name an article".to_string(),
        ));
    }

    let task_id = state.orchestrator.submit_search(&source, &dest).await?;

    Ok((StatusCode::CREATED, Json(CreateTaskResponse { task_id })))
}

/// Current status of a search, with the trace once found.
pub async fn get_task_handler(
    Extension(state): Extension<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<GetTaskResponse>> {
    let record = state.orchestrator.get_result(&task_id).await?;
    Ok(Json(GetTaskResponse {
        path: record.into(),
    }))
}

/// Drop one subscription to a search.
pub async fn delete_task_handler(
    Extension(state): Extension<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let remaining = state.orchestrator.unsubscribe(&task_id).await?;
    Ok(Json(DeleteTaskResponse { remaining }))
}
