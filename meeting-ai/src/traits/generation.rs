//! Text generation provider trait.

use crate::types::generation::GenerationRequest;
use crate::Error;
use async_trait::async_trait;

/// Abstraction for the LLM calls that make up each transform stage.
///
/// One call, one answer: implementations do not retry, and every failure
/// surfaces to the calling stage unchanged.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate text for the given instructions and content.
    async fn generate(&self, request: GenerationRequest) -> std::result::Result<String, Error>;

    /// Return unique identifier for this provider (e.g., "openai").
    fn provider_id(&self) -> &str;
}
