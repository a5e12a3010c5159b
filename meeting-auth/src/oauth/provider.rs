//! OAuth provider trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::token::Credential;
use crate::error::Error;

/// Known OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
}

impl ProviderKind {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
        }
    }
}

/// Trait for OAuth 2.0 providers able to renew an access token.
///
/// Implementations should report a rejected grant as
/// `OAuthErrorKind::InvalidGrant` whenever the provider returns a structured
/// error code, so the token manager does not have to guess from message text.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider kind.
    fn provider(&self) -> ProviderKind;

    /// Exchange a refresh token for a new credential.
    ///
    /// The returned credential may omit `refresh_token`; callers carry the
    /// previous one forward.
    async fn refresh_token(&self, refresh_token: &str) -> Result<Credential, Error>;
}
