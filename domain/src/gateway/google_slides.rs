//! Google Slides API v1 client, using Google Drive v3 to copy template decks.

use super::{bearer_token, http_client, json_body, network_error};
use async_trait::async_trait;
use log::*;
use meeting_ai::traits::slides::Provider;
use meeting_ai::types::slides::{DeckHandle, TextReplacement};
use meeting_ai::Error as ProviderError;
use meeting_auth::oauth::token::AccessTokenSource;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const SLIDES: &str = "Google Slides";
const DRIVE: &str = "Google Drive";

#[derive(Debug, Deserialize)]
struct CopiedFile {
    id: String,
}

pub struct Client {
    client: reqwest::Client,
    slides_base_url: String,
    drive_base_url: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl Client {
    pub fn new(
        slides_base_url: &str,
        drive_base_url: &str,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            slides_base_url: slides_base_url.trim_end_matches('/').to_string(),
            drive_base_url: drive_base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn deck_url(id: &str) -> String {
        format!("https://docs.google.com/presentation/d/{}/edit", id)
    }

    async fn batch_update(&self, deck_id: &str, requests: Vec<Value>) -> Result<(), ProviderError> {
        let token = bearer_token(self.tokens.as_ref()).await?;
        let response = self
            .client
            .post(format!(
                "{}/presentations/{}:batchUpdate",
                self.slides_base_url, deck_id
            ))
            .bearer_auth(token)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| network_error(SLIDES, e))?;
        let _: Value = json_body(SLIDES, response).await?;
        Ok(())
    }
}

#[async_trait]
impl Provider for Client {
    async fn copy_deck(&self, template_id: &str, title: &str) -> Result<DeckHandle, ProviderError> {
        let token = bearer_token(self.tokens.as_ref()).await?;
        let response = self
            .client
            .post(format!("{}/files/{}/copy", self.drive_base_url, template_id))
            .bearer_auth(token)
            .json(&json!({ "name": title }))
            .send()
            .await
            .map_err(|e| network_error(DRIVE, e))?;
        let copied: CopiedFile = json_body(DRIVE, response).await?;
        debug!("Copied template {} into {}", template_id, copied.id);
        Ok(DeckHandle {
            url: Self::deck_url(&copied.id),
            id: copied.id,
        })
    }

    async fn duplicate_slide(
        &self,
        deck_id: &str,
        slide_id: &str,
        insertion_index: usize,
    ) -> Result<String, ProviderError> {
        // Naming the copy up front lets duplicate and move share one batch.
        let page_id = format!("slide_{}", Uuid::new_v4().simple());
        self.batch_update(
            deck_id,
            vec![
                json!({ "duplicateObject": {
                    "objectId": slide_id,
                    "objectIds": { slide_id: page_id }
                } }),
                json!({ "updateSlidesPosition": {
                    "slideObjectIds": [page_id],
                    "insertionIndex": insertion_index
                } }),
            ],
        )
        .await?;
        Ok(page_id)
    }

    async fn replace_text_on_slide(
        &self,
        deck_id: &str,
        page_id: &str,
        replacements: Vec<TextReplacement>,
    ) -> Result<(), ProviderError> {
        let requests = replacements
            .into_iter()
            .map(|r| {
                json!({ "replaceAllText": {
                    "containsText": { "text": r.placeholder, "matchCase": true },
                    "replaceText": r.value,
                    "pageObjectIds": [page_id]
                } })
            })
            .collect();
        self.batch_update(deck_id, requests).await
    }

    async fn delete_slides(&self, deck_id: &str, slide_ids: Vec<String>) -> Result<(), ProviderError> {
        if slide_ids.is_empty() {
            return Ok(());
        }
        let requests = slide_ids
            .into_iter()
            .map(|id| json!({ "deleteObject": { "objectId": id } }))
            .collect();
        self.batch_update(deck_id, requests).await
    }
}
