//! # meeting-auth
//!
//! Every credential the artifact pipeline presents to an upstream service:
//! - Bearer API keys for the transcript and text-generation services
//! - The OAuth access token guarding every document and slide API call,
//!   with its refresh lifecycle and encrypted persistence
//! - The exponential backoff policy used against rate-limited upstreams
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meeting_auth::{
//!     api_key::BearerTokenAuth,
//!     oauth::{providers::google, token::{AccountTokens, FileStorage, Manager}},
//!     http::BackoffPolicy,
//! };
//! ```

pub mod api_key;
pub mod error;
pub mod http;
pub mod oauth;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
