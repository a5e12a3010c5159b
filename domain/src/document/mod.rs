//! Offset-safe assembly of position-addressed rich documents.
//!
//! Inserting text at offset `k` shifts every later offset, so content is
//! emitted in two ways: a single forward pass with a locally tracked cursor for
//! flowing text, and skeleton-then-fill for table cells, where the fills are
//! applied in strictly descending offset order.

pub mod assembler;
pub mod content;
pub mod plan;

pub use assembler::DocumentAssembler;
pub use content::{Block, DocumentContent};
pub use plan::{InsertOperation, ParagraphStyle};
