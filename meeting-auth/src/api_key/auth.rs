//! API key authentication trait.

use reqwest::RequestBuilder;

/// Known API key providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyProvider {
    TranscriptService,
    TextGeneration,
}

impl ApiKeyProvider {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyProvider::TranscriptService => "transcript_service",
            ApiKeyProvider::TextGeneration => "text_generation",
        }
    }
}

/// Trait for authenticating HTTP requests with API keys or bearer tokens.
pub trait ProviderAuth: Send + Sync {
    /// Get the provider identifier.
    fn provider(&self) -> ApiKeyProvider;

    /// Apply authentication to a request builder.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}
