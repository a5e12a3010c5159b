use std::error::Error as StdError;
use std::sync::Arc;

use domain::document::DocumentAssembler;
use domain::gateway::{google_docs, google_slides, text_generation, transcript_api};
use domain::slides::{DeckBuilder, SlideTemplate};
use domain::store::JsonFileStore;
use domain::transcript::TranscriptFetcher;
use domain::{InMemoryProgressStore, JobQueue, Orchestrator, ProgressStore};
use log::*;
use meeting_auth::api_key::{ApiKeyProvider, BearerTokenAuth};
use meeting_auth::oauth::providers::google;
use meeting_auth::oauth::token::{AccessTokenSource, AccountTokens, FileStorage, Manager};
use secrecy::SecretString;
use service::{config::Config, logging::Logger};
use web::AppState;

type BoxError = Box<dyn StdError + Send + Sync>;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "Starting meeting artifacts service ({:?} environment)",
        config.runtime_env()
    );

    if let Err(e) = run(config).await {
        error!("Service stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    let progress = Arc::new(InMemoryProgressStore::new());
    let store = Arc::new(JsonFileStore::new(config.artifact_store_path()));

    let generator = text_generation::Client::new(
        config.text_generation_base_url(),
        config.text_generation_model(),
        BearerTokenAuth::from_config(
            ApiKeyProvider::TextGeneration,
            config.text_generation_api_key(),
        )?,
    )?;

    let mut orchestrator = Orchestrator::new(progress.clone(), Arc::new(generator), store);

    match (config.transcript_base_url(), config.transcript_api_key()) {
        (Some(base_url), Some(key)) => {
            let client = transcript_api::Client::new(
                &base_url,
                BearerTokenAuth::from_config(ApiKeyProvider::TranscriptService, Some(key))?,
            )?;
            orchestrator = orchestrator.with_transcripts(TranscriptFetcher::new(Arc::new(client)));
        }
        _ => warn!("No transcript service configured; transcript links will be rejected"),
    }

    match google_tokens(&config)? {
        Some(tokens) => {
            let documents = google_docs::Client::new(
                config.google_docs_base_url(),
                Arc::clone(&tokens),
                config.document_batch_size,
            )?;
            orchestrator = orchestrator.with_documents(
                DocumentAssembler::new(Arc::new(documents))
                    .with_batch_size(config.document_batch_size),
            );

            if let Some((deck_id, title_layout_id, content_layout_id)) = config.slides_template() {
                let slides = google_slides::Client::new(
                    config.google_slides_base_url(),
                    config.google_drive_base_url(),
                    Arc::clone(&tokens),
                )?;
                orchestrator = orchestrator.with_decks(DeckBuilder::new(
                    Arc::new(slides),
                    SlideTemplate {
                        deck_id,
                        title_layout_id,
                        content_layout_id,
                    },
                ));
            } else {
                info!("No slide template configured; reports will not include a deck");
            }
        }
        None => warn!("No Google OAuth client configured; documents and decks are disabled"),
    }

    let (queue, workers) = JobQueue::start(
        Arc::new(orchestrator),
        config.worker_count,
        config.job_queue_capacity,
    );

    let progress: Arc<dyn ProgressStore> = progress;
    let sweeper = domain::progress::spawn_sweeper(
        progress,
        config.sweep_interval(),
        chrono::Duration::from_std(config.job_ttl())?,
    );

    let served = web::init_server(&config, AppState::new(queue)).await;

    sweeper.abort();
    workers.abort();
    Ok(served?)
}

/// The shared OAuth access token source, when a Google client is configured.
fn google_tokens(config: &Config) -> Result<Option<Arc<dyn AccessTokenSource>>, BoxError> {
    let (Some(client_id), Some(client_secret)) =
        (config.google_client_id(), config.google_client_secret())
    else {
        return Ok(None);
    };

    let encryption_key = config.credential_encryption_key();
    let storage = FileStorage::new(config.credential_path(), encryption_key.as_deref())?;
    let provider = google::Provider::new(
        client_id,
        SecretString::from(client_secret),
        config.google_token_url().to_string(),
    )?;

    let tokens: Arc<dyn AccessTokenSource> = Arc::new(AccountTokens::new(
        Arc::new(Manager::new(storage)),
        Arc::new(provider),
        config.google_account(),
    ));
    Ok(Some(tokens))
}
