//! Transcript service client.
//!
//! `GET {base}/meetings/{id}/transcript[?cursor=..]` returns one page of
//! segments plus an optional `nextCursor`.

use super::{http_client, json_body, network_error};
use async_trait::async_trait;
use log::*;
use meeting_ai::traits::transcript::Provider;
use meeting_ai::types::transcript::{MeetingMetadata, Page, Segment};
use meeting_ai::Error as ProviderError;
use meeting_auth::api_key::{BearerTokenAuth, ProviderAuth};
use serde::Deserialize;

const SERVICE: &str = "transcript service";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptPage {
    #[serde(default)]
    meeting: Option<MeetingMetadata>,
    #[serde(default)]
    segments: Vec<Segment>,
    #[serde(default)]
    next_cursor: Option<String>,
}

pub struct Client {
    client: reqwest::Client,
    base_url: String,
    auth: BearerTokenAuth,
}

impl Client {
    pub fn new(base_url: &str, auth: BearerTokenAuth) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }
}

#[async_trait]
impl Provider for Client {
    async fn fetch_page(
        &self,
        meeting_id: &str,
        cursor: Option<&str>,
    ) -> Result<Page, ProviderError> {
        let url = format!(
            "{}/meetings/{}/transcript",
            self.base_url,
            urlencoding::encode(meeting_id)
        );
        let mut request = self.client.get(url);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = self
            .auth
            .authenticate(request)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let page: TranscriptPage = json_body(SERVICE, response).await?;
        trace!(
            "Transcript page for {} had {} segments",
            meeting_id,
            page.segments.len()
        );

        Ok(Page {
            metadata: page.meeting,
            segments: page.segments,
            next_cursor: page.next_cursor.filter(|c| !c.is_empty()),
        })
    }

    fn provider_id(&self) -> &str {
        "transcript_service"
    }
}
