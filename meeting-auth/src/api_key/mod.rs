//! API key authentication for the upstream services the pipeline calls
//! with a static key (transcript retrieval, text generation).

mod auth;
mod bearer;

pub use auth::{ApiKeyProvider, ProviderAuth};
pub use bearer::BearerTokenAuth;
