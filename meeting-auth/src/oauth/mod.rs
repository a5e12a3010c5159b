//! OAuth 2.0 credential lifecycle for the document and slide APIs.

mod provider;

pub mod providers;
pub mod token;

pub use provider::{Provider, ProviderKind};
