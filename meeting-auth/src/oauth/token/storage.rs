//! Credential storage trait for persisting OAuth credentials.

use async_trait::async_trait;

use super::Credential;
use crate::error::Error;

/// Trait for storing and retrieving OAuth credentials.
///
/// Implementations should:
/// - Encrypt credentials at rest (e.g., using AES-256-GCM)
/// - Handle concurrent access safely
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a credential for an account and provider, replacing any previous one.
    ///
    /// # Arguments
    ///
    /// * `account_id` - Account identifier
    /// * `provider_id` - Provider identifier (e.g., "google")
    /// * `credential` - The credential to store
    async fn store(
        &self,
        account_id: &str,
        provider_id: &str,
        credential: Credential,
    ) -> Result<(), Error>;

    /// Retrieve the credential for an account and provider.
    ///
    /// # Returns
    ///
    /// `Some(Credential)` if found, `None` if not found.
    async fn get(&self, account_id: &str, provider_id: &str) -> Result<Option<Credential>, Error>;

    /// Delete the credential for an account and provider.
    async fn delete(&self, account_id: &str, provider_id: &str) -> Result<(), Error>;
}
