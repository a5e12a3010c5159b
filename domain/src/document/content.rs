//! Structured document content and the light markdown dialect produced by the
//! text generation stages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    Title(String),
    /// Level is clamped to 1..=3.
    Heading { level: u8, text: String },
    Paragraph(String),
    Bullets(Vec<String>),
    /// First row is the header row. Short rows are padded with empty cells.
    Table { rows: Vec<Vec<String>> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub blocks: Vec<Block>,
}

impl DocumentContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Title(text.into()));
        self
    }

    pub fn heading(mut self, level: u8, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Heading {
            level: level.clamp(1, 3),
            text: text.into(),
        });
        self
    }

    pub fn paragraph(mut self, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Paragraph(text.into()));
        self
    }

    pub fn bullets<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        if !items.is_empty() {
            self.blocks.push(Block::Bullets(items));
        }
        self
    }

    pub fn table(mut self, rows: Vec<Vec<String>>) -> Self {
        if !rows.is_empty() {
            self.blocks.push(Block::Table { rows });
        }
        self
    }

    /// Append the blocks parsed from generated markdown.
    pub fn markdown(mut self, text: &str) -> Self {
        self.blocks.extend(parse_markdown(text));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Parse `#`/`##`/`###` headings, `-`/`*` bullets and plain paragraphs.
/// Consecutive plain lines join into one paragraph; blank lines end it.
pub fn parse_markdown(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut bullets: Vec<String> = Vec::new();

    fn flush_paragraph(blocks: &mut Vec<Block>, paragraph: &mut Vec<&str>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(strip_emphasis(&paragraph.join(" "))));
            paragraph.clear();
        }
    }

    fn flush_bullets(blocks: &mut Vec<Block>, bullets: &mut Vec<String>) {
        if !bullets.is_empty() {
            blocks.push(Block::Bullets(std::mem::take(bullets)));
        }
    }

    for raw in text.lines() {
        let line = raw.trim();

        if line.is_empty() {
            flush_paragraph(&mut blocks, &mut paragraph);
            flush_bullets(&mut blocks, &mut bullets);
            continue;
        }

        if let Some((level, heading)) = heading_of(line) {
            flush_paragraph(&mut blocks, &mut paragraph);
            flush_bullets(&mut blocks, &mut bullets);
            blocks.push(Block::Heading {
                level,
                text: strip_emphasis(heading),
            });
        } else if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            flush_paragraph(&mut blocks, &mut paragraph);
            let item = strip_emphasis(item.trim());
            if !item.is_empty() {
                bullets.push(item);
            }
        } else {
            flush_bullets(&mut blocks, &mut bullets);
            paragraph.push(line);
        }
    }

    flush_paragraph(&mut blocks, &mut paragraph);
    flush_bullets(&mut blocks, &mut bullets);
    blocks
}

fn heading_of(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }
    Some(((hashes as u8).min(3), text))
}

fn strip_emphasis(text: &str) -> String {
    text.replace("**", "").replace("__", "").trim().to_string()
}
