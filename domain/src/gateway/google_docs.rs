//! Google Docs API v1 client.
//!
//! Offsets in requests and in the returned structure are UTF-16 code units,
//! which is what the document assembler plans in.

use super::{bearer_token, http_client, json_body, network_error};
use async_trait::async_trait;
use log::*;
use meeting_ai::traits::document::Provider;
use meeting_ai::types::document::{
    Cell, Element, ElementKind, Handle, NamedStyle, Range, Request, Structure, Table,
};
use meeting_ai::Error as ProviderError;
use meeting_auth::oauth::token::AccessTokenSource;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const SERVICE: &str = "Google Docs";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedDocument {
    document_id: String,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    #[serde(default)]
    body: Option<Body>,
}

#[derive(Debug, Default, Deserialize)]
struct Body {
    #[serde(default)]
    content: Vec<StructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuralElement {
    #[serde(default)]
    start_index: i64,
    #[serde(default)]
    end_index: i64,
    #[serde(default)]
    paragraph: Option<Paragraph>,
    #[serde(default)]
    table: Option<TableElement>,
}

#[derive(Debug, Deserialize)]
struct Paragraph {
    #[serde(default)]
    elements: Vec<ParagraphElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParagraphElement {
    #[serde(default)]
    text_run: Option<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableElement {
    #[serde(default)]
    table_rows: Vec<TableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRow {
    #[serde(default)]
    table_cells: Vec<TableCell>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableCell {
    #[serde(default)]
    start_index: i64,
    #[serde(default)]
    end_index: i64,
    #[serde(default)]
    content: Vec<StructuralElement>,
}

impl Paragraph {
    fn text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|e| e.text_run.as_ref())
            .map(|run| run.content.as_str())
            .collect()
    }
}

impl StructuralElement {
    fn into_element(self) -> Element {
        let kind = match (self.paragraph, self.table) {
            (Some(paragraph), _) => ElementKind::Paragraph {
                text: paragraph.text(),
            },
            (None, Some(table)) => ElementKind::Table(Table {
                start_index: self.start_index,
                rows: table
                    .table_rows
                    .into_iter()
                    .map(|row| row.table_cells.into_iter().map(TableCell::into_cell).collect())
                    .collect(),
            }),
            (None, None) => ElementKind::Other,
        };
        Element {
            start_index: self.start_index,
            end_index: self.end_index,
            kind,
        }
    }
}

impl TableCell {
    fn into_cell(self) -> Cell {
        let content_start = self
            .content
            .first()
            .map(|e| e.start_index)
            .unwrap_or(self.start_index + 1);
        let text = self
            .content
            .iter()
            .filter_map(|e| e.paragraph.as_ref())
            .map(Paragraph::text)
            .collect();
        Cell {
            start_index: self.start_index,
            end_index: self.end_index,
            content_start,
            text,
        }
    }
}

fn range_json(range: &Range) -> Value {
    json!({ "startIndex": range.start_index, "endIndex": range.end_index })
}

fn named_style_type(style: NamedStyle) -> &'static str {
    match style {
        NamedStyle::Title => "TITLE",
        NamedStyle::Heading1 => "HEADING_1",
        NamedStyle::Heading2 => "HEADING_2",
        NamedStyle::Heading3 => "HEADING_3",
        NamedStyle::NormalText => "NORMAL_TEXT",
    }
}

/// Wire form of one batchUpdate request.
pub(crate) fn request_json(request: &Request) -> Value {
    match request {
        Request::InsertText { index, text } => json!({
            "insertText": { "location": { "index": index }, "text": text }
        }),
        Request::InsertTable {
            index,
            rows,
            columns,
        } => json!({
            "insertTable": { "location": { "index": index }, "rows": rows, "columns": columns }
        }),
        Request::UpdateParagraphStyle { range, style } => json!({
            "updateParagraphStyle": {
                "range": range_json(range),
                "paragraphStyle": { "namedStyleType": named_style_type(*style) },
                "fields": "namedStyleType"
            }
        }),
        Request::CreateBullets { range } => json!({
            "createParagraphBullets": {
                "range": range_json(range),
                "bulletPreset": "BULLET_DISC_CIRCLE_SQUARE"
            }
        }),
        Request::UpdateTextStyle { range, bold } => json!({
            "updateTextStyle": {
                "range": range_json(range),
                "textStyle": { "bold": bold },
                "fields": "bold"
            }
        }),
    }
}

/// Google Docs client authorized by the shared OAuth credential.
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenSource>,
    max_batch_size: usize,
}

impl Client {
    pub fn new(
        base_url: &str,
        tokens: Arc<dyn AccessTokenSource>,
        max_batch_size: usize,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            max_batch_size: max_batch_size.max(1),
        })
    }

    fn document_url(id: &str) -> String {
        format!("https://docs.google.com/document/d/{}/edit", id)
    }
}

#[async_trait]
impl Provider for Client {
    async fn create_document(&self, title: &str) -> Result<Handle, ProviderError> {
        let token = bearer_token(self.tokens.as_ref()).await?;
        let response = self
            .client
            .post(format!("{}/documents", self.base_url))
            .bearer_auth(token)
            .json(&json!({ "title": title }))
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let created: CreatedDocument = json_body(SERVICE, response).await?;
        debug!("Google Docs created document {}", created.document_id);
        Ok(Handle {
            url: Self::document_url(&created.document_id),
            id: created.document_id,
        })
    }

    async fn batch_update(
        &self,
        document_id: &str,
        requests: Vec<Request>,
    ) -> Result<(), ProviderError> {
        let token = bearer_token(self.tokens.as_ref()).await?;
        let body: Vec<Value> = requests.iter().map(request_json).collect();
        let response = self
            .client
            .post(format!(
                "{}/documents/{}:batchUpdate",
                self.base_url, document_id
            ))
            .bearer_auth(token)
            .json(&json!({ "requests": body }))
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let _: Value = json_body(SERVICE, response).await?;
        Ok(())
    }

    async fn get_structure(&self, document_id: &str) -> Result<Structure, ProviderError> {
        let token = bearer_token(self.tokens.as_ref()).await?;
        let response = self
            .client
            .get(format!("{}/documents/{}", self.base_url, document_id))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| network_error(SERVICE, e))?;
        let document: DocumentResponse = json_body(SERVICE, response).await?;
        Ok(Structure {
            elements: document
                .body
                .unwrap_or_default()
                .content
                .into_iter()
                .map(StructuralElement::into_element)
                .collect(),
        })
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}
