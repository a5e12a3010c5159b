//! Credential lifecycle manager with per-account refresh locking.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Credential, Storage};
use crate::error::{token_error, Error, ErrorKind, HttpErrorKind, OAuthErrorKind, TokenErrorKind};
use crate::oauth::Provider;

/// Message fragments that identify a revoked or invalid grant when the provider
/// gave no structured error code.
const REVOKED_GRANT_MARKERS: &[&str] = &[
    "invalid_grant",
    "revoked",
    "unauthorized_client",
    "invalid_client",
];

/// Where the token handed to the caller came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The stored token was outside the refresh window.
    Current,
    /// The stored token was refreshed during this call.
    Refreshed,
    /// Refresh failed transiently; the stored token has not expired yet.
    Stale,
}

/// A usable access token plus the path that produced it.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: SecretString,
    pub source: TokenSource,
}

/// How a failed refresh is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshFailure {
    RevokedGrant,
    Transient,
}

/// Credential manager that coordinates credential retrieval and refresh with
/// per-account locking.
///
/// The per-account locking prevents concurrent pipeline steps from each
/// refreshing the same credential; the second caller re-reads storage after
/// acquiring the lock and finds the renewed token.
pub struct Manager<S: Storage> {
    storage: S,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: Storage> Manager<S> {
    /// Create a new credential manager with the given storage backend.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            refresh_locks: DashMap::new(),
        }
    }

    /// Get a usable access token for an account, refreshing if needed.
    ///
    /// This method:
    /// 1. Loads the stored credential (fatal if none exists)
    /// 2. Returns it untouched unless it is expired, inside the 10 minute
    ///    lookahead window, or of unknown expiry
    /// 3. Otherwise refreshes it under the account lock, carrying the previous
    ///    refresh token forward when the response omits one
    /// 4. On a transient refresh failure falls back to the stored token if it has
    ///    not actually expired yet
    ///
    /// Every `Err` returned here means the caller cannot proceed; errors for
    /// which [`Error::requires_reauth`] is true need out-of-band re-authentication.
    pub async fn get_valid_token<P: Provider + ?Sized>(
        &self,
        provider: &P,
        account_id: &str,
    ) -> Result<AccessToken, Error> {
        let provider_id = provider.provider().as_str();

        let credential = self.load(account_id, provider_id).await?;
        if !credential.needs_refresh_at(Utc::now()) {
            return Ok(AccessToken {
                token: credential.access_token,
                source: TokenSource::Current,
            });
        }

        debug!("Credential for {} needs refresh", account_id);

        // Get or create a lock for this account
        let lock = self
            .refresh_locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let _guard = lock.lock().await;

        // Another caller may have refreshed while we waited on the lock
        let credential = self.load(account_id, provider_id).await?;
        let now = Utc::now();
        if !credential.needs_refresh_at(now) {
            debug!("Credential was refreshed by another caller");
            return Ok(AccessToken {
                token: credential.access_token,
                source: TokenSource::Current,
            });
        }

        let refresh_token = match credential.refresh_token.as_ref() {
            Some(token) => token.clone(),
            None => {
                return Err(token_error(
                    TokenErrorKind::ReauthRequired,
                    "Credential needs refresh but no refresh token is stored",
                ))
            }
        };

        match provider.refresh_token(refresh_token.expose_secret()).await {
            Ok(refreshed) => {
                let merged = credential.merge_refreshed(refreshed);
                let token = merged.access_token.clone();
                if let Err(e) = self.storage.store(account_id, provider_id, merged).await {
                    warn!(
                        "Refreshed credential for {} could not be persisted: {}",
                        account_id, e
                    );
                }
                info!("Credential refreshed for {}", account_id);
                Ok(AccessToken {
                    token,
                    source: TokenSource::Refreshed,
                })
            }
            Err(err) => Self::after_refresh_failure(credential, err, now, account_id),
        }
    }

    fn after_refresh_failure(
        credential: Credential,
        err: Error,
        now: DateTime<Utc>,
        account_id: &str,
    ) -> Result<AccessToken, Error> {
        if classify_refresh_failure(&err) == RefreshFailure::RevokedGrant {
            warn!("Refresh grant for {} is invalid or revoked", account_id);
            return Err(Error {
                source: Some(Box::new(err)),
                error_kind: ErrorKind::Token(TokenErrorKind::ReauthRequired),
            });
        }

        if credential.is_expired_at(now) {
            warn!(
                "Credential for {} expired and refresh failed: {}",
                account_id, err
            );
            return Err(Error {
                source: Some(Box::new(err)),
                error_kind: ErrorKind::Token(TokenErrorKind::ReauthRequired),
            });
        }

        warn!(
            "Refresh failed for {} ({}); continuing with the unexpired stored token",
            account_id, err
        );
        Ok(AccessToken {
            token: credential.access_token,
            source: TokenSource::Stale,
        })
    }

    async fn load(&self, account_id: &str, provider_id: &str) -> Result<Credential, Error> {
        self.storage
            .get(account_id, provider_id)
            .await?
            .ok_or_else(|| token_error(TokenErrorKind::NotFound, "Not authenticated"))
    }

    /// Store a credential for an account.
    pub async fn store_credential(
        &self,
        account_id: &str,
        provider_id: &str,
        credential: Credential,
    ) -> Result<(), Error> {
        self.storage.store(account_id, provider_id, credential).await
    }

    /// Get the stored credential for an account (may be expired).
    pub async fn get_credential(
        &self,
        account_id: &str,
        provider_id: &str,
    ) -> Result<Option<Credential>, Error> {
        self.storage.get(account_id, provider_id).await
    }
}

/// Structured codes decide first; message text is only consulted when the
/// provider gave none.
fn classify_refresh_failure(err: &Error) -> RefreshFailure {
    match &err.error_kind {
        ErrorKind::OAuth(OAuthErrorKind::InvalidGrant) => RefreshFailure::RevokedGrant,
        ErrorKind::OAuth(OAuthErrorKind::Network) | ErrorKind::Http(HttpErrorKind::Network) => {
            RefreshFailure::Transient
        }
        _ => {
            let text = err.to_string().to_lowercase();
            if REVOKED_GRANT_MARKERS.iter().any(|m| text.contains(m)) {
                RefreshFailure::RevokedGrant
            } else {
                RefreshFailure::Transient
            }
        }
    }
}

/// Anything able to hand out a bearer token for an upstream call.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, Error>;
}

/// A [`Manager`] bound to one provider and account.
pub struct AccountTokens<S: Storage, P: Provider> {
    manager: Arc<Manager<S>>,
    provider: Arc<P>,
    account_id: String,
}

impl<S: Storage, P: Provider> AccountTokens<S, P> {
    pub fn new(manager: Arc<Manager<S>>, provider: Arc<P>, account_id: impl Into<String>) -> Self {
        Self {
            manager,
            provider,
            account_id: account_id.into(),
        }
    }
}

#[async_trait]
impl<S: Storage, P: Provider> AccessTokenSource for AccountTokens<S, P> {
    async fn access_token(&self) -> Result<SecretString, Error> {
        let token = self
            .manager
            .get_valid_token(self.provider.as_ref(), &self.account_id)
            .await?;
        Ok(token.token)
    }
}
