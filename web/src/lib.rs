//! HTTP polling surface for the artifact pipeline: job submission, progress
//! polling and history deletion.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use domain::store::ArtifactStore;
use domain::{JobQueue, ProgressStore};
use log::*;
use service::config::Config;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
pub mod router;

pub use error::{Error, Result};

/// Everything a request handler needs; cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub queue: JobQueue,
    pub progress: Arc<dyn ProgressStore>,
    pub store: Arc<dyn ArtifactStore>,
}

impl AppState {
    pub fn new(queue: JobQueue) -> Self {
        let orchestrator = queue.orchestrator();
        Self {
            progress: orchestrator.progress(),
            store: orchestrator.store(),
            queue,
        }
    }
}

pub async fn init_server(config: &Config, app_state: AppState) -> std::io::Result<()> {
    let host = config.interface();
    let port = config.port;
    info!("Server starting... listening for connections on http://{host}:{port}");

    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    let app = router::define_routes(app_state).layer(cors_layer(&config.allowed_origins));

    axum::serve(listener, app).await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid allowed origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}
