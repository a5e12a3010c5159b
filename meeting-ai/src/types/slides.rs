//! Types for slide deck operations.

use serde::{Deserialize, Serialize};

/// A created deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckHandle {
    pub id: String,
    pub url: String,
}

/// Replace every occurrence of `placeholder` with `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReplacement {
    pub placeholder: String,
    pub value: String,
}

impl TextReplacement {
    pub fn new(placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            value: value.into(),
        }
    }
}
