//! Transcript retrieval provider trait.

use crate::types::transcript::Page;
use crate::Error;
use async_trait::async_trait;

/// Abstraction for a service that stores finished meeting transcripts.
///
/// Transcripts are keyed by meeting id and returned one page at a time; a page
/// with no `next_cursor` is the last one. Rate-limited responses must surface as
/// [`Error::RateLimited`] so callers can back off.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Fetch one page of the meeting's transcript, starting at `cursor`
    /// (`None` for the first page).
    async fn fetch_page(
        &self,
        meeting_id: &str,
        cursor: Option<&str>,
    ) -> std::result::Result<Page, Error>;

    /// Return unique identifier for this provider.
    fn provider_id(&self) -> &str;
}
