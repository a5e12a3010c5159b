use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::{JobKind, JobRequest};
use log::*;
use serde_json::json;

use crate::{AppState, Error};

/// POST queue a report job
pub async fn create_report(
    State(app_state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> Result<impl IntoResponse, Error> {
    submit(app_state, JobKind::Report, request).await
}

/// POST queue an action items job
pub async fn create_action_items(
    State(app_state): State<AppState>,
    Json(request): Json<JobRequest>,
) -> Result<impl IntoResponse, Error> {
    submit(app_state, JobKind::ActionItems, request).await
}

async fn submit(
    app_state: AppState,
    kind: JobKind,
    request: JobRequest,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new {} job", kind);

    let job_id = app_state.queue.submit(kind, request).await?;

    Ok((StatusCode::ACCEPTED, Json(json!({ "jobId": job_id }))))
}

/// GET the progress snapshot of a job
pub async fn progress(State(app_state): State<AppState>, Path(id): Path<String>) -> Response {
    match app_state.progress.get(&id).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => {
            debug!("GET progress for unknown job {}", id);
            (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
        }
    }
}
