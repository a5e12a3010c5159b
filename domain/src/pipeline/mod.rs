//! The staged job pipelines.
//!
//! A job runs a fixed sequence of named steps. Every step marks itself running
//! when it starts and complete when it resolves, so pollers see fine-grained
//! progress even inside a fan-out group. A failure in a required step fails
//! the job with `"<step name>: <cause>"`; optional steps degrade to `None`.

pub mod action_items;
pub(crate) mod prompts;
pub mod queue;
pub mod report;

use crate::document::DocumentAssembler;
use crate::error::Error;
use crate::progress::{JobKind, ProgressStore, StatusUpdate};
use crate::slides::DeckBuilder;
use crate::store::ArtifactStore;
use crate::transcript::{Transcript, TranscriptFetcher};
use log::*;
use meeting_ai::traits::generation::Provider as GenerationProvider;
use meeting_ai::GenerationRequest;
use prompts::Prompt;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub use queue::{JobQueue, WorkerPool};

/// Inbound job parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub transcript_link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Where step 0 gets its transcript from. Exactly one branch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptSource {
    Direct(String),
    Link(String),
}

impl JobRequest {
    /// Pick the transcript source; a direct transcript wins over a link.
    pub fn source(&self) -> Result<TranscriptSource, Error> {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        if let Some(text) = non_blank(&self.transcript) {
            return Ok(TranscriptSource::Direct(text));
        }
        if let Some(link) = non_blank(&self.transcript_link) {
            return Ok(TranscriptSource::Link(link));
        }
        Err(Error::validation(
            "either a transcript or a transcript link is required",
        ))
    }

    pub fn title(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Runs jobs against the configured collaborators. Transcript fetching,
/// document creation and deck creation are absent when not configured.
pub struct Orchestrator {
    progress: Arc<dyn ProgressStore>,
    generator: Arc<dyn GenerationProvider>,
    store: Arc<dyn ArtifactStore>,
    fetcher: Option<TranscriptFetcher>,
    documents: Option<DocumentAssembler>,
    decks: Option<DeckBuilder>,
}

impl Orchestrator {
    pub fn new(
        progress: Arc<dyn ProgressStore>,
        generator: Arc<dyn GenerationProvider>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            progress,
            generator,
            store,
            fetcher: None,
            documents: None,
            decks: None,
        }
    }

    pub fn with_transcripts(mut self, fetcher: TranscriptFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_documents(mut self, documents: DocumentAssembler) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn with_decks(mut self, decks: DeckBuilder) -> Self {
        self.decks = Some(decks);
        self
    }

    pub fn progress(&self) -> Arc<dyn ProgressStore> {
        Arc::clone(&self.progress)
    }

    pub fn store(&self) -> Arc<dyn ArtifactStore> {
        Arc::clone(&self.store)
    }

    /// Drive an already initialized job to a terminal status.
    pub async fn run(
        &self,
        job_id: &str,
        kind: JobKind,
        source: TranscriptSource,
        title: Option<String>,
    ) {
        if let Err(e) = self
            .progress
            .set_status(job_id, StatusUpdate::processing())
            .await
        {
            warn!("Job {} could not start: {}", job_id, e);
            return;
        }
        info!("Job {} ({}) started", job_id, kind);

        let steps = Steps::new(self.progress.as_ref(), job_id, kind);
        let outcome = match kind {
            JobKind::Report => report::run(self, &steps, source, title).await,
            JobKind::ActionItems => action_items::run(self, &steps, source, title).await,
        };

        let update = match outcome {
            Ok(result) => {
                info!("Job {} completed", job_id);
                StatusUpdate::completed(result)
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                StatusUpdate::failed(e.describe())
            }
        };
        if let Err(e) = self.progress.set_status(job_id, update).await {
            warn!("Job {} final status not recorded: {}", job_id, e);
        }
    }

    /// Step 0: return the transcript text and any title the upstream knows.
    async fn acquire_transcript(&self, source: TranscriptSource) -> Result<Transcript, Error> {
        match source {
            TranscriptSource::Direct(text) => Ok(Transcript {
                metadata: None,
                text,
            }),
            TranscriptSource::Link(link) => {
                let fetcher = self.fetcher.as_ref().ok_or_else(|| {
                    Error::config("transcript links need a configured transcript service")
                })?;
                fetcher.fetch(&link).await
            }
        }
    }

    async fn generate(&self, prompt: &Prompt, content: impl Into<String>) -> Result<String, Error> {
        let request = GenerationRequest::new(prompt.instructions, content, prompt.options);
        Ok(self.generator.generate(request).await?)
    }

    fn documents(&self) -> Result<&DocumentAssembler, Error> {
        self.documents
            .as_ref()
            .ok_or_else(|| Error::config("no document service configured"))
    }

    fn decks(&self) -> Result<&DeckBuilder, Error> {
        self.decks
            .as_ref()
            .ok_or_else(|| Error::config("no slide template configured"))
    }

    /// Final step: saving is attempted unconditionally and never fails the job.
    async fn persist(&self, steps: &Steps<'_>, index: usize, kind: JobKind, result: &Value) {
        steps.mark(index, false).await;
        if let Err(e) = self
            .store
            .upsert(kind.table(), steps.job_id, result.clone())
            .await
        {
            error!(
                "Job {} result not saved to {}: {}",
                steps.job_id,
                kind.table(),
                e
            );
        }
        steps.mark(index, true).await;
    }
}

/// Reports step boundaries for one job.
pub(crate) struct Steps<'a> {
    progress: &'a dyn ProgressStore,
    job_id: &'a str,
    names: &'static [&'static str],
}

impl<'a> Steps<'a> {
    fn new(progress: &'a dyn ProgressStore, job_id: &'a str, kind: JobKind) -> Self {
        Self {
            progress,
            job_id,
            names: kind.step_names(),
        }
    }

    fn name(&self, index: usize) -> &'static str {
        self.names.get(index).copied().unwrap_or("Unknown step")
    }

    async fn mark(&self, index: usize, completed: bool) {
        if let Err(e) = self.progress.update(self.job_id, index, completed).await {
            warn!(
                "Job {} step {} progress not recorded: {}",
                self.job_id, index, e
            );
        }
    }

    /// Run a required step; its failure fails the job.
    pub(crate) async fn required<T, F>(&self, index: usize, step: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        self.mark(index, false).await;
        debug!("Job {} step {} ({}) running", self.job_id, index, self.name(index));
        match step.await {
            Ok(value) => {
                self.mark(index, true).await;
                Ok(value)
            }
            Err(e) => Err(Error::stage(self.name(index), e)),
        }
    }

    /// Run an optional step; a failure is logged, replaced by `None`, and the
    /// step still completes.
    pub(crate) async fn optional<T, F>(&self, index: usize, step: F) -> Option<T>
    where
        F: Future<Output = Result<T, Error>>,
    {
        self.mark(index, false).await;
        let value = match step.await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    "Job {} optional step {} ({}) skipped: {}",
                    self.job_id,
                    index,
                    self.name(index),
                    e
                );
                None
            }
        };
        self.mark(index, true).await;
        value
    }
}

/// Bullet items from generated markdown, or its non-empty lines when the model
/// didn't use bullets.
pub(crate) fn list_items(text: &str) -> Vec<String> {
    use crate::document::content::{parse_markdown, Block};

    let bullets: Vec<String> = parse_markdown(text)
        .into_iter()
        .filter_map(|block| match block {
            Block::Bullets(items) => Some(items),
            _ => None,
        })
        .flatten()
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*']).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
