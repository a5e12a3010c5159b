//! Types for transcript retrieval.

use serde::{Deserialize, Serialize};

/// Descriptive data about the meeting a transcript belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// One spoken segment attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub speaker: String,
    pub text: String,
}

impl Segment {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// One page of transcript segments.
///
/// Metadata is normally present on the first page only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub metadata: Option<MeetingMetadata>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
