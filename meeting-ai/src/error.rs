//! Error types for collaborator operations.

use std::fmt;

/// Universal error type that abstracts provider-specific errors into common variants.
///
/// All provider implementations map their native errors to these variants,
/// preserving context while keeping the domain layer provider-agnostic.
#[derive(Debug)]
pub enum Error {
    /// OAuth or API key authentication failures. Indicates credentials are invalid,
    /// expired, or lack necessary permissions.
    Authentication(String),

    /// Network connectivity issues, DNS failures, or connection timeouts.
    Network(String),

    /// Invalid parameters, missing required fields, or malformed configuration.
    Configuration(String),

    /// Provider-specific business logic errors (e.g., document not found, quota exceeded).
    Provider(String),

    /// Requested resource (meeting, document, slide) does not exist.
    NotFound(String),

    /// Provider rate limit exceeded. Callers that retry decide their own delay;
    /// `retry_after_seconds` reports what the provider asked for, 0 if nothing.
    RateLimited { retry_after_seconds: u64 },

    /// Failed to serialize a request body.
    Serialization(String),

    /// Failed to deserialize a provider response to the expected type.
    Deserialization(String),

    /// Catch-all for errors that don't fit other categories.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Authentication(msg) => write!(f, "Authentication failed: {}", msg),
            Error::Network(msg) => write!(f, "Network error: {}", msg),
            Error::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Provider(msg) => write!(f, "Provider error: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::RateLimited {
                retry_after_seconds,
            } => {
                write!(f, "Rate limited: retry after {}s", retry_after_seconds)
            }
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Other(err) => write!(f, "Other error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Deserialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_detection() {
        assert!(Error::RateLimited {
            retry_after_seconds: 0
        }
        .is_rate_limited());
        assert!(!Error::Network("reset".into()).is_rate_limited());
    }

    #[test]
    fn test_display() {
        let err = Error::RateLimited {
            retry_after_seconds: 30,
        };
        assert_eq!(err.to_string(), "Rate limited: retry after 30s");
    }
}
