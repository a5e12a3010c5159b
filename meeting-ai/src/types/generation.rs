//! Types for text generation calls.

use serde::{Deserialize, Serialize};

/// Sampling controls for a single generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens.
    pub max_output_length: u32,
    /// Sampling temperature; 0.0 is deterministic.
    pub randomness: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_length: 2048,
            randomness: 0.3,
        }
    }
}

/// One text generation call: instructions, content, and sampling controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system_instructions: String,
    pub user_content: String,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(
        system_instructions: impl Into<String>,
        user_content: impl Into<String>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            system_instructions: system_instructions.into(),
            user_content: user_content.into(),
            options,
        }
    }
}
