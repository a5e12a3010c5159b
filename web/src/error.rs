use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self.0.error_kind);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            debug!("Request rejected: {}", self.0);
        }

        match &self.0.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Validation(message)) => {
                (status, message.clone()).into_response()
            }
            _ => (status, status.canonical_reason().unwrap_or("ERROR")).into_response(),
        }
    }
}

fn status_for(kind: &DomainErrorKind) -> StatusCode {
    match kind {
        DomainErrorKind::Internal(internal_error_kind) => match internal_error_kind {
            InternalErrorKind::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InternalErrorKind::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            InternalErrorKind::Config
            | InternalErrorKind::Persistence
            | InternalErrorKind::Stage(_)
            | InternalErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
        DomainErrorKind::External(external_error_kind) => match external_error_kind {
            ExternalErrorKind::Network
            | ExternalErrorKind::RateLimited
            | ExternalErrorKind::Auth(_) => StatusCode::BAD_GATEWAY,
            ExternalErrorKind::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
