//! Standard Bearer token authentication.

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use super::{ApiKeyProvider, ProviderAuth};
use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Standard Bearer token authentication.
///
/// Uses the standard `Authorization: Bearer <token>` header pattern.
pub struct BearerTokenAuth {
    provider: ApiKeyProvider,
    token: SecretString,
}

impl BearerTokenAuth {
    /// Create a new Bearer token authenticator.
    pub fn new(provider: ApiKeyProvider, token: SecretString) -> Self {
        Self { provider, token }
    }

    /// Build an authenticator from an optional configured key, failing when it is
    /// absent or blank.
    pub fn from_config(provider: ApiKeyProvider, key: Option<String>) -> Result<Self, Error> {
        match key.map(|k| k.trim().to_string()) {
            Some(k) if !k.is_empty() => Ok(Self::new(provider, SecretString::from(k))),
            Some(_) => Err(api_key_error(
                ApiKeyErrorKind::InvalidFormat,
                &format!("Blank API key configured for {}", provider.as_str()),
            )),
            None => Err(api_key_error(
                ApiKeyErrorKind::Missing,
                &format!("No API key configured for {}", provider.as_str()),
            )),
        }
    }

    /// Get a reference to the token.
    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

impl ProviderAuth for BearerTokenAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }
}
