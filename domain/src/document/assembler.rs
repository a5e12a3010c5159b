use crate::document::content::{Block, DocumentContent};
use crate::document::plan::{
    chunk_requests, plan_cell_fills, CellFill, ForwardPlanner, InsertOperation, ParagraphStyle,
};
use crate::error::Error;
use log::*;
use meeting_ai::traits::document::Provider as DocumentProvider;
use meeting_ai::types::document::{ElementKind, Handle, Range, Request, Structure, Table};
use std::sync::Arc;

/// First insertable offset in a fresh document body.
const BODY_START: i64 = 1;

/// Builds documents through a [`DocumentProvider`].
pub struct DocumentAssembler {
    provider: Arc<dyn DocumentProvider>,
    batch_size: usize,
}

/// Paragraph recorded during planning so styles can be applied after the
/// structure is re-read.
struct PlannedParagraph {
    text: String,
    style: ParagraphStyle,
}

impl DocumentAssembler {
    pub fn new(provider: Arc<dyn DocumentProvider>) -> Self {
        let batch_size = provider.max_batch_size();
        Self {
            provider,
            batch_size,
        }
    }

    /// Use a smaller per-call ceiling than the provider's.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, self.provider.max_batch_size().max(1));
        self
    }

    /// Create a fresh document named `title` and fill it with `content`.
    pub async fn create(&self, title: &str, content: &DocumentContent) -> Result<Handle, Error> {
        let handle = self.provider.create_document(title).await?;
        info!("Created document {} ({})", handle.id, title);
        self.assemble(&handle.id, content).await?;
        Ok(handle)
    }

    /// Write `content` into an empty document.
    pub async fn assemble(&self, document_id: &str, content: &DocumentContent) -> Result<(), Error> {
        let mut planner = ForwardPlanner::new(BODY_START);
        let mut paragraphs: Vec<PlannedParagraph> = Vec::new();
        let mut table_count = 0;

        for block in &content.blocks {
            if planner.push_block(block) {
                continue;
            }
            if let Block::Table { rows } = block {
                let pending = planner.take();
                remember(&mut paragraphs, &pending);
                self.insert(document_id, &pending).await?;

                let after_table = self.insert_table(document_id, planner.cursor(), rows).await?;
                planner.seek(after_table);
                table_count += 1;
            }
        }

        let pending = planner.take();
        remember(&mut paragraphs, &pending);
        self.insert(document_id, &pending).await?;

        // Every insertion above moved offsets; style from the current structure.
        let structure = self.provider.get_structure(document_id).await?;
        let styles = style_requests(&structure, &paragraphs, table_count);
        debug!(
            "Applying {} style requests to document {}",
            styles.len(),
            document_id
        );
        self.apply(document_id, styles).await
    }

    async fn insert(&self, document_id: &str, operations: &[InsertOperation]) -> Result<(), Error> {
        let requests = operations.iter().map(InsertOperation::to_request).collect();
        self.apply(document_id, requests).await
    }

    /// Insert an empty `rows x columns` skeleton at `at`, then fill its cells.
    /// Returns the offset just past the table.
    async fn insert_table(
        &self,
        document_id: &str,
        at: i64,
        rows: &[Vec<String>],
    ) -> Result<i64, Error> {
        let row_count = rows.len();
        let column_count = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);

        self.apply(
            document_id,
            vec![Request::InsertTable {
                index: at,
                rows: row_count,
                columns: column_count,
            }],
        )
        .await?;

        let structure = self.provider.get_structure(document_id).await?;
        let table = table_at_or_after(&structure, at).ok_or_else(|| {
            Error::other(format!(
                "inserted table not found at or after offset {} in document {}",
                at, document_id
            ))
        })?;

        let mut fills = Vec::with_capacity(row_count * column_count);
        for (r, row) in table.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let text = rows
                    .get(r)
                    .and_then(|row| row.get(c))
                    .cloned()
                    .unwrap_or_default();
                fills.push(CellFill {
                    anchor: cell.content_start,
                    text,
                });
            }
        }
        let table_start = table.start_index;
        self.insert(document_id, &plan_cell_fills(fills)).await?;

        let structure = self.provider.get_structure(document_id).await?;
        structure
            .elements
            .iter()
            .find(|e| matches!(&e.kind, ElementKind::Table(t) if t.start_index == table_start))
            .map(|e| e.end_index)
            .ok_or_else(|| {
                Error::other(format!(
                    "filled table at offset {} vanished from document {}",
                    table_start, document_id
                ))
            })
    }

    /// Apply requests in chunks, strictly in order; each chunk commits before
    /// the next is sent.
    async fn apply(&self, document_id: &str, requests: Vec<Request>) -> Result<(), Error> {
        if requests.is_empty() {
            return Ok(());
        }
        let chunks = chunk_requests(requests, self.batch_size);
        let total = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            trace!(
                "Document {} batch {}/{} ({} requests)",
                document_id,
                i + 1,
                total,
                chunk.len()
            );
            self.provider.batch_update(document_id, chunk).await?;
        }
        Ok(())
    }
}

fn remember(paragraphs: &mut Vec<PlannedParagraph>, operations: &[InsertOperation]) {
    paragraphs.extend(operations.iter().filter_map(|op| {
        op.style.map(|style| PlannedParagraph {
            text: op.text.trim_end_matches('\n').to_string(),
            style,
        })
    }));
}

fn table_at_or_after(structure: &Structure, offset: i64) -> Option<&Table> {
    structure
        .tables()
        .filter(|t| t.start_index >= offset)
        .min_by_key(|t| t.start_index)
}

/// Match planned paragraphs to the current structure in document order and
/// build range-scoped style requests. Bolds the header row of the first
/// `table_count` tables.
fn style_requests(
    structure: &Structure,
    planned: &[PlannedParagraph],
    table_count: usize,
) -> Vec<Request> {
    let mut requests = Vec::new();
    let mut next = planned.iter().peekable();

    for (element, text) in structure.paragraphs() {
        let Some(paragraph) = next.peek() else {
            break;
        };
        if text.trim_end_matches('\n') != paragraph.text {
            continue;
        }
        let range = Range::new(element.start_index, element.end_index);
        if let Some(style) = paragraph.style.named_style() {
            requests.push(Request::UpdateParagraphStyle { range, style });
        } else if paragraph.style == ParagraphStyle::Bullet {
            requests.push(Request::CreateBullets { range });
        }
        next.next();
    }

    if next.peek().is_some() {
        warn!(
            "{} planned paragraphs not found when styling document",
            next.count()
        );
    }

    for table in structure.tables().take(table_count) {
        if let Some(header) = table.rows.first() {
            requests.extend(
                header
                    .iter()
                    .map(|cell| cell.text_range())
                    .filter(|range| !range.is_empty())
                    .map(|range| Request::UpdateTextStyle { range, bold: true }),
            );
        }
    }

    requests
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use meeting_ai::types::document::{Cell, Element};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Unit {
        Char(u16),
        TableStart,
        RowStart,
        CellStart,
        TableEnd,
    }

    /// In-memory document with the remote API's offset semantics: every UTF-16
    /// unit and every structural marker occupies one offset, the body starts
    /// at 1, and inserting a table places a newline before it.
    pub(crate) struct FakeDocument {
        units: Mutex<Vec<Unit>>,
        pub(crate) batches: Mutex<Vec<Vec<Request>>>,
        max_batch: usize,
    }

    impl FakeDocument {
        pub(crate) fn new(max_batch: usize) -> Self {
            Self {
                units: Mutex::new(vec![Unit::Char(b'\n' as u16)]),
                batches: Mutex::new(Vec::new()),
                max_batch,
            }
        }

        pub(crate) fn requests(&self) -> Vec<Request> {
            self.batches.lock().unwrap().concat()
        }

        fn apply(&self, request: &Request) {
            let mut units = self.units.lock().unwrap();
            match request {
                Request::InsertText { index, text } => {
                    let at = (*index - 1) as usize;
                    assert!(at <= units.len(), "insert at {} out of bounds", index);
                    let chars: Vec<Unit> = text.encode_utf16().map(Unit::Char).collect();
                    units.splice(at..at, chars);
                }
                Request::InsertTable {
                    index,
                    rows,
                    columns,
                } => {
                    let at = (*index - 1) as usize;
                    let mut skeleton = vec![Unit::Char(b'\n' as u16), Unit::TableStart];
                    for _ in 0..*rows {
                        skeleton.push(Unit::RowStart);
                        for _ in 0..*columns {
                            skeleton.push(Unit::CellStart);
                            skeleton.push(Unit::Char(b'\n' as u16));
                        }
                    }
                    skeleton.push(Unit::TableEnd);
                    units.splice(at..at, skeleton);
                }
                _ => {}
            }
        }

        pub(crate) fn structure(&self) -> Structure {
            let units = self.units.lock().unwrap();
            let mut elements = Vec::new();
            let mut i = 0;
            while i < units.len() {
                let start = i as i64 + 1;
                if units[i] == Unit::TableStart {
                    let mut rows: Vec<Vec<Cell>> = Vec::new();
                    i += 1;
                    while units[i] != Unit::TableEnd {
                        match &units[i] {
                            Unit::RowStart => {
                                rows.push(Vec::new());
                                i += 1;
                            }
                            Unit::CellStart => {
                                let cell_start = i as i64 + 1;
                                i += 1;
                                let mut text = Vec::new();
                                while let Unit::Char(c) = units[i] {
                                    text.push(c);
                                    i += 1;
                                }
                                rows.last_mut().unwrap().push(Cell {
                                    start_index: cell_start,
                                    end_index: i as i64 + 1,
                                    content_start: cell_start + 1,
                                    text: String::from_utf16_lossy(&text),
                                });
                            }
                            other => panic!("unexpected {:?}", other),
                        }
                    }
                    i += 1;
                    elements.push(Element {
                        start_index: start,
                        end_index: i as i64 + 1,
                        kind: ElementKind::Table(Table {
                            start_index: start,
                            rows,
                        }),
                    });
                } else {
                    let mut text = Vec::new();
                    while i < units.len() {
                        match units[i] {
                            Unit::Char(c) => {
                                text.push(c);
                                i += 1;
                                if c == b'\n' as u16 {
                                    break;
                                }
                            }
                            _ => break,
                        }
                    }
                    elements.push(Element {
                        start_index: start,
                        end_index: i as i64 + 1,
                        kind: ElementKind::Paragraph {
                            text: String::from_utf16_lossy(&text),
                        },
                    });
                }
            }
            Structure { elements }
        }

        pub(crate) fn paragraph_texts(&self) -> Vec<String> {
            self.structure()
                .paragraphs()
                .map(|(_, text)| text.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl DocumentProvider for FakeDocument {
        async fn create_document(&self, title: &str) -> Result<Handle, meeting_ai::Error> {
            Ok(Handle {
                id: format!("doc-{}", title),
                url: format!("https://docs.example.com/doc-{}", title),
            })
        }

        async fn batch_update(
            &self,
            _document_id: &str,
            requests: Vec<Request>,
        ) -> Result<(), meeting_ai::Error> {
            assert!(requests.len() <= self.max_batch);
            for request in &requests {
                self.apply(request);
            }
            self.batches.lock().unwrap().push(requests);
            Ok(())
        }

        async fn get_structure(&self, _document_id: &str) -> Result<Structure, meeting_ai::Error> {
            Ok(self.structure())
        }

        fn max_batch_size(&self) -> usize {
            self.max_batch
        }
    }

    fn table_cells(structure: &Structure) -> Vec<Vec<String>> {
        structure
            .tables()
            .next()
            .unwrap()
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| c.text.trim_end_matches('\n').to_string())
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn flowing_content_lands_in_order() {
        let doc = Arc::new(FakeDocument::new(100));
        let assembler = DocumentAssembler::new(doc.clone());
        let content = DocumentContent::new()
            .title("Strategy")
            .heading(1, "Summary")
            .paragraph("We met.")
            .bullets(["one", "two"]);

        assembler.create("t", &content).await.unwrap();

        assert_eq!(
            doc.paragraph_texts(),
            vec!["Strategy\n", "Summary\n", "We met.\n", "one\n", "two\n", "\n"]
        );
        let requests = doc.requests();
        assert!(requests.contains(&Request::UpdateParagraphStyle {
            range: Range::new(1, 10),
            style: meeting_ai::types::document::NamedStyle::Title,
        }));
        assert!(requests.contains(&Request::CreateBullets {
            range: Range::new(26, 30)
        }));
    }

    #[tokio::test]
    async fn table_cells_are_filled_in_descending_order() {
        let doc = Arc::new(FakeDocument::new(100));
        let assembler = DocumentAssembler::new(doc.clone());
        let rows = vec![
            vec!["Action".to_string(), "Owner".to_string(), "Due".to_string()],
            vec!["Ship".to_string(), "Ana".to_string(), "Fri".to_string()],
            vec!["Test".to_string(), "Bo".to_string(), String::new()],
        ];
        let content = DocumentContent::new()
            .heading(1, "Action items")
            .table(rows)
            .paragraph("After the table");

        assembler.assemble("doc", &content).await.unwrap();

        let structure = doc.structure();
        assert_eq!(
            table_cells(&structure),
            vec![
                vec!["Action", "Owner", "Due"],
                vec!["Ship", "Ana", "Fri"],
                vec!["Test", "Bo", ""],
            ]
        );
        assert_eq!(
            doc.paragraph_texts(),
            vec!["Action items\n", "\n", "After the table\n", "\n"]
        );

        // 3x3 skeleton, one intentionally empty cell.
        let fill_batch = doc
            .batches
            .lock()
            .unwrap()
            .iter()
            .find(|batch| batch.len() == 8)
            .cloned()
            .unwrap();
        let offsets: Vec<i64> = fill_batch
            .iter()
            .map(|r| match r {
                Request::InsertText { index, .. } => *index,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert!(offsets.windows(2).all(|pair| pair[0] > pair[1]));

        let bolded = doc
            .requests()
            .into_iter()
            .filter(|r| matches!(r, Request::UpdateTextStyle { bold: true, .. }))
            .count();
        assert_eq!(bolded, 3);
    }

    #[tokio::test]
    async fn large_plans_are_chunked_and_applied_in_order() {
        let doc = Arc::new(FakeDocument::new(4));
        let assembler = DocumentAssembler::new(doc.clone());
        let items: Vec<String> = (0..10).map(|i| format!("item {}", i)).collect();
        let content = DocumentContent::new().bullets(items.clone());

        assembler.assemble("doc", &content).await.unwrap();

        let mut expected: Vec<String> = items.iter().map(|i| format!("{}\n", i)).collect();
        expected.push("\n".to_string());
        assert_eq!(doc.paragraph_texts(), expected);
        assert!(doc.batches.lock().unwrap().iter().all(|b| b.len() <= 4));
    }

    #[tokio::test]
    async fn batch_size_override_is_bounded_by_provider() {
        let doc = Arc::new(FakeDocument::new(10));
        let assembler = DocumentAssembler::new(doc).with_batch_size(500);
        assert_eq!(assembler.batch_size, 10);
    }
}
