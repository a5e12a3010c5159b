//! Slide deck provider trait.

use crate::types::slides::{DeckHandle, TextReplacement};
use crate::Error;
use async_trait::async_trait;

/// Abstraction for a template-driven slide deck service.
///
/// Text replacement is always scoped to one slide so placeholders on the
/// template slides and on other copies stay untouched.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Copy a whole template deck into a new deck named `title`.
    async fn copy_deck(
        &self,
        template_id: &str,
        title: &str,
    ) -> std::result::Result<DeckHandle, Error>;

    /// Duplicate one slide, move the copy to `insertion_index`, and return the
    /// copy's page id.
    async fn duplicate_slide(
        &self,
        deck_id: &str,
        slide_id: &str,
        insertion_index: usize,
    ) -> std::result::Result<String, Error>;

    /// Replace placeholders on a single slide only.
    async fn replace_text_on_slide(
        &self,
        deck_id: &str,
        page_id: &str,
        replacements: Vec<TextReplacement>,
    ) -> std::result::Result<(), Error>;

    /// Delete slides (used for the leftover template slides).
    async fn delete_slides(
        &self,
        deck_id: &str,
        slide_ids: Vec<String>,
    ) -> std::result::Result<(), Error>;
}
