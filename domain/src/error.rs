//! Error types for the `domain` layer.
use meeting_auth::error::{Error as MeetingAuthError, ErrorKind as MeetingAuthErrorKind};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. Lower layers
/// (`meeting-auth`, `meeting-ai`, `reqwest`) are translated here so `web` never
/// depends on them directly.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    /// Input rejected before any job was created.
    Validation(String),
    /// A collaborator is not configured.
    Config,
    /// The opaque result store failed.
    Persistence,
    /// An uncaught failure inside a required pipeline step.
    Stage(String),
    /// The job queue has no free slot; nothing was recorded.
    QueueFull,
    Other(String),
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
    RateLimited,
    Auth(AuthErrorKind),
    Other(String),
}

/// Authentication failures against upstream services.
#[derive(Debug, PartialEq)]
pub enum AuthErrorKind {
    /// No credential is stored at all.
    NotAuthenticated,
    /// The credential can't be renewed; re-authenticate out of band.
    ReauthRequired,
    /// Credentials were rejected or a refresh failed in a way that may clear up.
    Rejected,
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Validation(message.into())),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Error {
            source: Some(message.into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
        }
    }

    pub fn persistence(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Error {
            source: Some(source.into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Persistence),
        }
    }

    pub fn stage(step: &str, cause: Error) -> Self {
        let message = format!("{}: {}", step, cause.describe());
        Error {
            source: Some(Box::new(cause)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Stage(message)),
        }
    }

    pub fn queue_full(capacity: usize) -> Self {
        let message = format!("job queue is full ({} jobs waiting)", capacity);
        Error {
            source: Some(message.into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::QueueFull),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(message.into())),
        }
    }

    /// Human readable message suitable for a job's `error` field.
    pub fn describe(&self) -> String {
        match (&self.error_kind, &self.source) {
            (DomainErrorKind::Internal(InternalErrorKind::Stage(message)), _) => message.clone(),
            (DomainErrorKind::Internal(InternalErrorKind::Validation(message)), _) => {
                message.clone()
            }
            (kind, Some(source)) => format!("{:?}: {}", kind, source),
            (kind, None) => format!("{:?}", kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Domain Error: {}", self.describe())
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
        // Errors that result from issues building the reqwest::Client instance. This
        // type of error will occur prior to any network calls being made.
        if err.is_builder() {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                    "Failed to build reqwest client".to_string(),
                )),
            }
        // Errors that result from issues with the network call itself.
        } else {
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Network),
            }
        }
    }
}

fn auth_error_kind(err: &MeetingAuthError) -> DomainErrorKind {
    use meeting_auth::error::TokenErrorKind;

    match &err.error_kind {
        MeetingAuthErrorKind::Token(TokenErrorKind::NotFound) => {
            DomainErrorKind::External(ExternalErrorKind::Auth(AuthErrorKind::NotAuthenticated))
        }
        _ if err.requires_reauth() => {
            DomainErrorKind::External(ExternalErrorKind::Auth(AuthErrorKind::ReauthRequired))
        }
        MeetingAuthErrorKind::Http(_) => DomainErrorKind::External(ExternalErrorKind::Network),
        MeetingAuthErrorKind::OAuth(_) | MeetingAuthErrorKind::Token(_) => {
            DomainErrorKind::External(ExternalErrorKind::Auth(AuthErrorKind::Rejected))
        }
        MeetingAuthErrorKind::ApiKey(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
        MeetingAuthErrorKind::Storage(_) => {
            DomainErrorKind::Internal(InternalErrorKind::Other(err.to_string()))
        }
    }
}

impl From<MeetingAuthError> for Error {
    fn from(err: MeetingAuthError) -> Self {
        Error {
            error_kind: auth_error_kind(&err),
            source: Some(Box::new(err)),
        }
    }
}

impl From<meeting_ai::Error> for Error {
    fn from(err: meeting_ai::Error) -> Self {
        use meeting_ai::Error as AiError;

        let error_kind = match &err {
            AiError::RateLimited { .. } => {
                DomainErrorKind::External(ExternalErrorKind::RateLimited)
            }
            AiError::Authentication(_) => {
                DomainErrorKind::External(ExternalErrorKind::Auth(AuthErrorKind::Rejected))
            }
            AiError::Network(_) => DomainErrorKind::External(ExternalErrorKind::Network),
            AiError::Configuration(_) => DomainErrorKind::Internal(InternalErrorKind::Config),
            AiError::Provider(msg) | AiError::NotFound(msg) => {
                DomainErrorKind::External(ExternalErrorKind::Other(msg.clone()))
            }
            AiError::Serialization(msg) | AiError::Deserialization(msg) => {
                DomainErrorKind::External(ExternalErrorKind::Other(msg.clone()))
            }
            // Gateways wrap credential failures so the auth outcome survives.
            AiError::Other(inner) => match inner.downcast_ref::<MeetingAuthError>() {
                Some(auth) => auth_error_kind(auth),
                None => DomainErrorKind::External(ExternalErrorKind::Other(inner.to_string())),
            },
        };
        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "JSON (de)serialization failed".to_string(),
            )),
        }
    }
}
