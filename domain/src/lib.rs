//! The meeting artifact pipelines: job progress, transcript acquisition,
//! offset-safe document assembly, slide decks, and the staged orchestrator that
//! ties them together.
//!
//! Lower layers (`meeting-auth`, `meeting-ai`) are wrapped here so the `web`
//! crate only needs this one.

pub mod document;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod progress;
pub mod slides;
pub mod store;
pub mod transcript;

pub use pipeline::{JobQueue, JobRequest, Orchestrator, WorkerPool};
pub use progress::{InMemoryProgressStore, JobKind, JobStatus, ProgressSnapshot, ProgressStore};
