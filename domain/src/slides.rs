//! Template-driven slide decks.
//!
//! A deck is built by copying a template deck, duplicating one of its layout
//! slides per generated slide, filling placeholders on that duplicate only, and
//! finally deleting the layout slides.

use crate::error::Error;
use log::*;
use meeting_ai::traits::slides::Provider as SlidesProvider;
use meeting_ai::types::slides::{DeckHandle, TextReplacement};
use std::sync::Arc;

pub const TITLE_PLACEHOLDER: &str = "{{title}}";
pub const BODY_PLACEHOLDER: &str = "{{body}}";

/// Ids of the template deck and of its two layout slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideTemplate {
    pub deck_id: String,
    pub title_layout_id: String,
    pub content_layout_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideLayout {
    Title,
    Content,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub layout: SlideLayout,
    pub title: String,
    pub body: String,
}

impl Slide {
    pub fn title(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            layout: SlideLayout::Title,
            title: title.into(),
            body: subtitle.into(),
        }
    }

    pub fn content(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            layout: SlideLayout::Content,
            title: title.into(),
            body: body.into(),
        }
    }
}

pub struct DeckBuilder {
    provider: Arc<dyn SlidesProvider>,
    template: SlideTemplate,
}

impl DeckBuilder {
    pub fn new(provider: Arc<dyn SlidesProvider>, template: SlideTemplate) -> Self {
        Self { provider, template }
    }

    pub async fn build(&self, title: &str, slides: &[Slide]) -> Result<DeckHandle, Error> {
        let deck = self.provider.copy_deck(&self.template.deck_id, title).await?;
        info!("Copied slide template into deck {} ({})", deck.id, title);

        for (index, slide) in slides.iter().enumerate() {
            let layout_id = match slide.layout {
                SlideLayout::Title => &self.template.title_layout_id,
                SlideLayout::Content => &self.template.content_layout_id,
            };
            let page_id = self
                .provider
                .duplicate_slide(&deck.id, layout_id, index)
                .await?;
            self.provider
                .replace_text_on_slide(
                    &deck.id,
                    &page_id,
                    vec![
                        TextReplacement::new(TITLE_PLACEHOLDER, slide.title.as_str()),
                        TextReplacement::new(BODY_PLACEHOLDER, slide.body.as_str()),
                    ],
                )
                .await?;
        }

        self.provider
            .delete_slides(
                &deck.id,
                vec![
                    self.template.title_layout_id.clone(),
                    self.template.content_layout_id.clone(),
                ],
            )
            .await?;
        debug!("Deck {} built with {} slides", deck.id, slides.len());

        Ok(deck)
    }
}
