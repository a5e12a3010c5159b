//! Google OAuth provider implementation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{oauth_error, Error, ErrorKind, OAuthErrorKind};
use crate::oauth::token::Credential;
use crate::oauth::ProviderKind;

/// Default Google OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// Error body returned by the token endpoint (RFC 6749 section 5.2).
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Google OAuth provider.
///
/// Only the refresh grant is implemented; the initial credential is obtained
/// out of band and persisted through a token `Storage`.
pub struct Provider {
    client_id: String,
    client_secret: SecretString,
    token_url: String,
    http_client: reqwest::Client,
}

impl Provider {
    /// Create a new Google OAuth provider.
    ///
    /// # Arguments
    ///
    /// * `client_id` - Google OAuth client ID
    /// * `client_secret` - Google OAuth client secret
    /// * `token_url` - Token endpoint, normally [`DEFAULT_TOKEN_URL`]
    pub fn new(
        client_id: String,
        client_secret: SecretString,
        token_url: String,
    ) -> Result<Self, Error> {
        let http_client = reqwest::Client::builder().use_rustls_tls().build()?;

        Ok(Self {
            client_id,
            client_secret,
            token_url,
            http_client,
        })
    }
}

#[async_trait]
impl crate::oauth::Provider for Provider {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<Credential, Error> {
        debug!("Refreshing Google access token");

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach Google token endpoint: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::OAuth(OAuthErrorKind::Network),
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let body: TokenResponse = response.json().await.map_err(|e| {
                warn!("Failed to parse Google token response: {:?}", e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: ErrorKind::OAuth(OAuthErrorKind::InvalidResponse),
                }
            })?;

            return Ok(Credential {
                access_token: SecretString::from(body.access_token),
                refresh_token: body.refresh_token.map(SecretString::from),
                expires_at: body.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
                token_type: body.token_type.unwrap_or_else(|| "Bearer".to_string()),
                scopes: body
                    .scope
                    .map(|s| s.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
            });
        }

        let text = response.text().await.unwrap_or_default();
        warn!("Google token refresh rejected with {}: {}", status, text);

        match serde_json::from_str::<TokenErrorResponse>(&text) {
            Ok(body) if body.error == "invalid_grant" => Err(oauth_error(
                OAuthErrorKind::InvalidGrant,
                body.error_description
                    .as_deref()
                    .unwrap_or("Refresh token is invalid or revoked"),
            )),
            Ok(body) => Err(oauth_error(
                OAuthErrorKind::TokenRefreshFailed,
                &format!(
                    "{}: {}",
                    body.error,
                    body.error_description.unwrap_or_default()
                ),
            )),
            Err(_) => Err(oauth_error(
                OAuthErrorKind::TokenRefreshFailed,
                &format!("HTTP {}: {}", status, text),
            )),
        }
    }
}
