use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use domain::JobKind;
use log::*;

use crate::{AppState, Error};

/// DELETE a saved report
pub async fn delete_report(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    delete(app_state, JobKind::Report, id).await
}

/// DELETE a saved action items record
pub async fn delete_action_items(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, Error> {
    delete(app_state, JobKind::ActionItems, id).await
}

async fn delete(app_state: AppState, kind: JobKind, id: String) -> Result<StatusCode, Error> {
    debug!("DELETE {} record {}", kind, id);

    if !app_state.store.delete(kind.table(), &id).await? {
        info!("No {} record {} to delete", kind, id);
    }

    Ok(StatusCode::NO_CONTENT)
}
