//! Error types for the `meeting-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for meeting-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in meeting-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    ApiKey(ApiKeyErrorKind),
    OAuth(OAuthErrorKind),
    Token(TokenErrorKind),
    Storage(StorageErrorKind),
    Http(HttpErrorKind),
}

/// Errors from API key authentication operations.
#[derive(Debug, PartialEq)]
pub enum ApiKeyErrorKind {
    Missing,
    InvalidFormat,
}

/// Errors from OAuth operations.
#[derive(Debug, PartialEq)]
pub enum OAuthErrorKind {
    /// The provider rejected the refresh grant as invalid or revoked.
    InvalidGrant,
    TokenRefreshFailed,
    Network,
    InvalidResponse,
}

/// Errors from token lifecycle management.
#[derive(Debug, PartialEq)]
pub enum TokenErrorKind {
    /// No credential has ever been persisted for the account.
    NotFound,
    /// The credential can't be used or renewed; the account must re-authenticate.
    ReauthRequired,
}

/// Errors from credential storage operations.
#[derive(Debug, PartialEq)]
pub enum StorageErrorKind {
    EncryptionFailed,
    DecryptionFailed,
    Io,
    Serialization,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl Error {
    /// True when the failure can only be resolved by re-authenticating out of band.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::Token(TokenErrorKind::NotFound)
                | ErrorKind::Token(TokenErrorKind::ReauthRequired)
                | ErrorKind::OAuth(OAuthErrorKind::InvalidGrant)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match &self.error_kind {
            ErrorKind::ApiKey(kind) => format!("API key error: {:?}", kind),
            ErrorKind::OAuth(kind) => format!("OAuth error: {:?}", kind),
            ErrorKind::Token(kind) => format!("Token error: {:?}", kind),
            ErrorKind::Storage(kind) => format!("Storage error: {:?}", kind),
            ErrorKind::Http(kind) => format!("HTTP error: {:?}", kind),
        };
        match &self.source {
            Some(source) => write!(f, "{} ({})", kind, source),
            None => write!(f, "{}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

/// Helper function to create API key errors.
pub fn api_key_error(kind: ApiKeyErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::ApiKey(kind),
    }
}

/// Helper function to create OAuth errors.
pub fn oauth_error(kind: OAuthErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::OAuth(kind),
    }
}

/// Helper function to create token errors.
pub fn token_error(kind: TokenErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Token(kind),
    }
}

/// Helper function to create storage errors.
pub fn storage_error(kind: StorageErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Storage(kind),
    }
}
