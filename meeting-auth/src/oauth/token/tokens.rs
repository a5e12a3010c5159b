//! OAuth credential types.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// How far ahead of expiry a credential is proactively refreshed.
pub const REFRESH_LOOKAHEAD_MINUTES: i64 = 10;

/// OAuth credential with metadata.
#[derive(Debug, Clone)]
pub struct Credential {
    /// Access token for API requests.
    pub access_token: SecretString,
    /// Refresh token for obtaining new access tokens.
    pub refresh_token: Option<SecretString>,
    /// When the access token expires. `None` means unknown.
    pub expires_at: Option<DateTime<Utc>>,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Granted scopes.
    pub scopes: Vec<String>,
}

impl Credential {
    /// True when the access token should be renewed before use: it has expired,
    /// expires within the lookahead window, or its expiry is unknown.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => expires <= now + Duration::minutes(REFRESH_LOOKAHEAD_MINUTES),
            None => true,
        }
    }

    /// True only when the expiry is known and already past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expires| expires <= now).unwrap_or(false)
    }

    /// Lay a refresh response over this credential.
    ///
    /// A refresh token, once observed, is never dropped and scopes carry over when
    /// the response leaves them out. The expiry always comes from the response: a
    /// response without one leaves it unknown rather than reviving the old value.
    pub fn merge_refreshed(self, refreshed: Credential) -> Credential {
        Credential {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token.or(self.refresh_token),
            expires_at: refreshed.expires_at,
            token_type: refreshed.token_type,
            scopes: if refreshed.scopes.is_empty() {
                self.scopes
            } else {
                refreshed.scopes
            },
        }
    }
}

/// Plain serializable form of a [`Credential`], used by storage backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<&Credential> for StoredCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            access_token: credential.access_token.expose_secret().clone(),
            refresh_token: credential
                .refresh_token
                .as_ref()
                .map(|rt| rt.expose_secret().clone()),
            expires_at: credential.expires_at,
            token_type: credential.token_type.clone(),
            scopes: credential.scopes.clone(),
        }
    }
}

impl From<StoredCredential> for Credential {
    fn from(stored: StoredCredential) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            refresh_token: stored.refresh_token.map(SecretString::from),
            expires_at: stored.expires_at,
            token_type: stored.token_type,
            scopes: stored.scopes,
        }
    }
}
