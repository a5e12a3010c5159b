//! HTTP clients for the upstream collaborators. Each client implements one of
//! the provider traits from `meeting-ai` and reports failures as
//! `meeting_ai::Error`.

pub mod google_docs;
pub mod google_slides;
pub mod text_generation;
pub mod transcript_api;

use log::*;
use meeting_ai::Error as ProviderError;
use meeting_auth::oauth::token::AccessTokenSource;
use reqwest::{Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .use_rustls_tls()
        .build()
        .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {}", e)))
}

pub(crate) fn network_error(service: &str, err: reqwest::Error) -> ProviderError {
    warn!("Request to {} failed: {:?}", service, err);
    ProviderError::Network(format!("{}: {}", service, err))
}

/// Fetch a bearer token, keeping the credential error intact so the domain
/// can tell "re-authenticate" apart from transient failures.
pub(crate) async fn bearer_token(tokens: &dyn AccessTokenSource) -> Result<String, ProviderError> {
    let token = tokens
        .access_token()
        .await
        .map_err(|e| ProviderError::Other(Box::new(e)))?;
    Ok(token.expose_secret().to_string())
}

/// Translate a non-success response into a provider error.
pub(crate) async fn status_error(service: &str, response: Response) -> ProviderError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let body = response.text().await.unwrap_or_default();
    warn!("{} returned {}: {}", service, status, body);

    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited {
            retry_after_seconds: retry_after,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Authentication(format!("{} returned {}: {}", service, status, body))
        }
        StatusCode::NOT_FOUND => ProviderError::NotFound(format!("{}: {}", service, body)),
        _ => ProviderError::Provider(format!("{} returned {}: {}", service, status, body)),
    }
}

/// Check the status and decode a JSON body.
pub(crate) async fn json_body<T: DeserializeOwned>(
    service: &str,
    response: Response,
) -> Result<T, ProviderError> {
    if !response.status().is_success() {
        return Err(status_error(service, response).await);
    }
    response.json::<T>().await.map_err(|e| {
        warn!("Failed to parse {} response: {:?}", service, e);
        ProviderError::Deserialization(format!("{}: {}", service, e))
    })
}
