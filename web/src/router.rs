use crate::controller::{health_check_controller, history_controller, job_controller};
use crate::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(job_routes(app_state.clone()))
        .merge(history_routes(app_state))
        .merge(health_routes())
}

fn job_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/jobs/report", post(job_controller::create_report))
        .route(
            "/jobs/action-items",
            post(job_controller::create_action_items),
        )
        .route("/jobs/{id}/progress", get(job_controller::progress))
        .with_state(app_state)
}

fn history_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/reports/{id}", delete(history_controller::delete_report))
        .route(
            "/action-items/{id}",
            delete(history_controller::delete_action_items),
        )
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}
