//! Collaborator abstractions for the meeting artifact pipeline.
//!
//! This crate provides trait-based abstractions for every external service a
//! pipeline job talks to:
//! - Text generation (the transform stages)
//! - Paginated transcript retrieval
//! - Position-addressed rich documents
//! - Template-driven slide decks
//!
//! The design is provider-agnostic: the domain layer drives these traits and
//! tests substitute fakes without touching the network.

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::Error;
pub use types::generation::{GenerationOptions, GenerationRequest};
