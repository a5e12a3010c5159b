//! Collaborator data types.

pub mod document;
pub mod generation;
pub mod slides;
pub mod transcript;
