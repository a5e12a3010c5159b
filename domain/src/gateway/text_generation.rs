//! OpenAI-compatible chat completions client.

use super::{http_client, json_body, network_error};
use async_trait::async_trait;
use log::*;
use meeting_ai::traits::generation::Provider;
use meeting_ai::{Error as ProviderError, GenerationRequest};
use meeting_auth::api_key::{BearerTokenAuth, ProviderAuth};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "text generation";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One request, one answer; no retries at this layer.
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    model: String,
    auth: BearerTokenAuth,
}

impl Client {
    pub fn new(base_url: &str, model: &str, auth: BearerTokenAuth) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            auth,
        })
    }
}

#[async_trait]
impl Provider for Client {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_instructions,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_content,
                },
            ],
            max_tokens: request.options.max_output_length,
            temperature: request.options.randomness,
        };

        let response = self
            .auth
            .authenticate(
                self.client
                    .post(format!("{}/chat/completions", self.base_url)),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;

        let completion: ChatResponse = json_body(SERVICE, response).await?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Provider("completion contained no text".to_string()))?;
        trace!("Generated {} characters with {}", text.len(), self.model);
        Ok(text.trim().to_string())
    }

    fn provider_id(&self) -> &str {
        "openai"
    }
}
