//! Insertion planning against a position-addressed text buffer.
//!
//! Offsets count UTF-16 code units, matching the remote document API.

use crate::document::content::Block;
use meeting_ai::types::document::{NamedStyle, Request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    Title,
    Heading(u8),
    Normal,
    Bullet,
}

impl ParagraphStyle {
    /// Named paragraph style, when the paragraph needs one.
    pub fn named_style(&self) -> Option<NamedStyle> {
        match self {
            ParagraphStyle::Title => Some(NamedStyle::Title),
            ParagraphStyle::Heading(1) => Some(NamedStyle::Heading1),
            ParagraphStyle::Heading(2) => Some(NamedStyle::Heading2),
            ParagraphStyle::Heading(_) => Some(NamedStyle::Heading3),
            ParagraphStyle::Normal | ParagraphStyle::Bullet => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOperation {
    pub target_offset: i64,
    pub text: String,
    pub style: Option<ParagraphStyle>,
}

impl InsertOperation {
    pub fn to_request(&self) -> Request {
        Request::InsertText {
            index: self.target_offset,
            text: self.text.clone(),
        }
    }
}

pub fn utf16_len(text: &str) -> i64 {
    text.encode_utf16().count() as i64
}

/// Emits flowing content left to right. The cursor advances by each inserted
/// length before the next target is computed, so no target ever needs to be
/// re-read from the server.
#[derive(Debug)]
pub struct ForwardPlanner {
    cursor: i64,
    operations: Vec<InsertOperation>,
}

impl ForwardPlanner {
    pub fn new(start: i64) -> Self {
        Self {
            cursor: start,
            operations: Vec::new(),
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Move the cursor after content was inserted elsewhere (e.g. a table).
    pub fn seek(&mut self, offset: i64) {
        self.cursor = offset;
    }

    /// Insert one paragraph; a trailing newline is added.
    pub fn push_paragraph(&mut self, text: &str, style: ParagraphStyle) {
        let text = format!("{}\n", text.replace('\n', " "));
        let len = utf16_len(&text);
        self.operations.push(InsertOperation {
            target_offset: self.cursor,
            text,
            style: Some(style),
        });
        self.cursor += len;
    }

    /// Plan a flowing block. Tables are not flowing content and return `false`.
    pub fn push_block(&mut self, block: &Block) -> bool {
        match block {
            Block::Title(text) => self.push_paragraph(text, ParagraphStyle::Title),
            Block::Heading { level, text } => {
                self.push_paragraph(text, ParagraphStyle::Heading(*level))
            }
            Block::Paragraph(text) => self.push_paragraph(text, ParagraphStyle::Normal),
            Block::Bullets(items) => {
                for item in items {
                    self.push_paragraph(item, ParagraphStyle::Bullet);
                }
            }
            Block::Table { .. } => return false,
        }
        true
    }

    /// Drain the operations planned so far; the cursor is kept.
    pub fn take(&mut self) -> Vec<InsertOperation> {
        std::mem::take(&mut self.operations)
    }
}

/// One table cell's anchor offset and the text destined for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFill {
    pub anchor: i64,
    pub text: String,
}

/// Order cell fills against one pre-existing skeleton.
///
/// Every fill shifts all later anchors, so the fills are emitted in strictly
/// descending anchor order: each target is still valid because only cells with
/// smaller anchors remain untouched. Empty cells produce no operation.
pub fn plan_cell_fills(fills: Vec<CellFill>) -> Vec<InsertOperation> {
    let mut operations: Vec<InsertOperation> = fills
        .into_iter()
        .filter(|fill| !fill.text.is_empty())
        .map(|fill| InsertOperation {
            target_offset: fill.anchor,
            text: fill.text.replace('\n', " "),
            style: None,
        })
        .collect();
    operations.sort_by(|a, b| b.target_offset.cmp(&a.target_offset));
    operations
}

/// Split requests into ordered chunks no larger than `max_size`.
pub fn chunk_requests(requests: Vec<Request>, max_size: usize) -> Vec<Vec<Request>> {
    let max_size = max_size.max(1);
    let mut chunks = Vec::with_capacity(requests.len().div_ceil(max_size));
    let mut current = Vec::with_capacity(max_size.min(requests.len()));
    for request in requests {
        current.push(request);
        if current.len() == max_size {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_planner_advances_by_utf16_length() {
        let mut planner = ForwardPlanner::new(1);
        planner.push_block(&Block::Title("Plan".to_string()));
        planner.push_block(&Block::Bullets(vec!["é😀".to_string(), "b".to_string()]));

        let ops = planner.take();
        let targets: Vec<i64> = ops.iter().map(|op| op.target_offset).collect();
        // "Plan\n" = 5 units, "é😀\n" = 1 + 2 + 1 = 4 units
        assert_eq!(targets, vec![1, 6, 10]);
        assert_eq!(planner.cursor(), 12);
        assert_eq!(ops[1].style, Some(ParagraphStyle::Bullet));
    }

    #[test]
    fn tables_are_not_flowing_content() {
        let mut planner = ForwardPlanner::new(1);
        assert!(!planner.push_block(&Block::Table {
            rows: vec![vec!["a".to_string()]]
        }));
        assert!(planner.take().is_empty());
        assert_eq!(planner.cursor(), 1);
    }

    #[test]
    fn cell_fills_emit_one_insert_per_cell_in_descending_order() {
        // 3 rows x 2 columns, anchors strictly increasing in document order,
        // handed over in scrambled order.
        let anchors = [5, 7, 10, 12, 15, 17];
        let scrambled = [3, 0, 5, 1, 4, 2];
        let fills = scrambled
            .iter()
            .map(|&i| CellFill {
                anchor: anchors[i],
                text: format!("cell{}", i),
            })
            .collect();

        let ops = plan_cell_fills(fills);

        assert_eq!(ops.len(), 6);
        assert!(ops
            .windows(2)
            .all(|pair| pair[0].target_offset > pair[1].target_offset));
        assert_eq!(ops[0].text, "cell5");
    }

    #[test]
    fn empty_cells_are_skipped() {
        let ops = plan_cell_fills(vec![
            CellFill {
                anchor: 3,
                text: "x".to_string(),
            },
            CellFill {
                anchor: 5,
                text: String::new(),
            },
        ]);
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn chunks_preserve_order_and_bound_size() {
        let requests: Vec<Request> = (0..250)
            .map(|i| Request::InsertText {
                index: i,
                text: "x".to_string(),
            })
            .collect();

        let chunks = chunk_requests(requests.clone(), 100);

        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![100, 100, 50]
        );
        assert_eq!(chunks.concat(), requests);
    }

    #[test]
    fn heading_levels_map_to_named_styles() {
        assert_eq!(
            ParagraphStyle::Heading(2).named_style(),
            Some(NamedStyle::Heading2)
        );
        assert_eq!(
            ParagraphStyle::Heading(3).named_style(),
            Some(NamedStyle::Heading3)
        );
        assert_eq!(ParagraphStyle::Bullet.named_style(), None);
    }
}
