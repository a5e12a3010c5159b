//! Types for position-addressed rich documents.
//!
//! Offsets count UTF-16 code units from the start of the document body, which
//! is how the document APIs in use address text.

use serde::{Deserialize, Serialize};

/// A created document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub id: String,
    pub url: String,
}

/// Half-open offset range `[start_index, end_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_index: i64,
    pub end_index: i64,
}

impl Range {
    pub fn new(start_index: i64, end_index: i64) -> Self {
        Self {
            start_index,
            end_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end_index <= self.start_index
    }
}

/// Paragraph styles the pipeline applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedStyle {
    Title,
    Heading1,
    Heading2,
    Heading3,
    NormalText,
}

/// One mutation against a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    InsertText { index: i64, text: String },
    InsertTable { index: i64, rows: usize, columns: usize },
    UpdateParagraphStyle { range: Range, style: NamedStyle },
    CreateBullets { range: Range },
    UpdateTextStyle { range: Range, bold: bool },
}

/// Current structure of a document body, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub elements: Vec<Element>,
}

impl Structure {
    /// Top-level paragraphs, in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = (&Element, &str)> {
        self.elements.iter().filter_map(|e| match &e.kind {
            ElementKind::Paragraph { text } => Some((e, text.as_str())),
            _ => None,
        })
    }

    /// Top-level tables, in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.elements.iter().filter_map(|e| match &e.kind {
            ElementKind::Table(table) => Some(table),
            _ => None,
        })
    }

    /// Offset just past the last element, 1 for an empty structure.
    pub fn end_index(&self) -> i64 {
        self.elements.last().map(|e| e.end_index).unwrap_or(1)
    }
}

/// A top-level structural element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub start_index: i64,
    pub end_index: i64,
    pub kind: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    /// Paragraph text including its trailing newline.
    Paragraph { text: String },
    Table(Table),
    Other,
}

/// A table as a grid of cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub start_index: i64,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub start_index: i64,
    pub end_index: i64,
    /// Offset where text typed into the cell lands (start of its first paragraph).
    pub content_start: i64,
    /// Current cell text including the trailing newline.
    pub text: String,
}

impl Cell {
    /// Range covering the cell's text, excluding the trailing newline.
    pub fn text_range(&self) -> Range {
        let len = self.text.trim_end_matches('\n').encode_utf16().count() as i64;
        Range::new(self.content_start, self.content_start + len)
    }
}
