//! The strategy report pipeline.
//!
//! ```text
//! 0 transcript -> {1 summary, 2 themes, 3 decisions} -> 4 draft -> 5 refine
//!              -> {6 document?, 7 presentation?} -> 8 save
//! ```

use super::{list_items, prompts, Orchestrator, Steps, TranscriptSource};
use crate::document::content::{parse_markdown, Block};
use crate::document::DocumentContent;
use crate::error::Error;
use crate::progress::JobKind;
use crate::slides::Slide;
use meeting_ai::types::document::Handle;
use meeting_ai::types::slides::DeckHandle;
use serde_json::{json, Value};

const DEFAULT_TITLE: &str = "Meeting Strategy Report";

/// Generated text shared by the document and the deck.
struct ReportText<'a> {
    title: &'a str,
    summary: &'a str,
    themes: &'a [String],
    decisions: &'a [String],
    strategy: &'a str,
}

pub(crate) async fn run(
    orchestrator: &Orchestrator,
    steps: &Steps<'_>,
    source: TranscriptSource,
    title: Option<String>,
) -> Result<Value, Error> {
    let transcript = steps
        .required(0, orchestrator.acquire_transcript(source))
        .await?;
    let title = title
        .or_else(|| transcript.metadata.as_ref().and_then(|m| m.title.clone()))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let text = transcript.text.as_str();

    let (summary, themes, decisions) = tokio::try_join!(
        steps.required(1, orchestrator.generate(&prompts::SUMMARIZE, text)),
        steps.required(2, orchestrator.generate(&prompts::KEY_THEMES, text)),
        steps.required(3, orchestrator.generate(&prompts::DECISIONS, text)),
    )?;

    let draft = steps
        .required(
            4,
            orchestrator.generate(
                &prompts::DRAFT_STRATEGY,
                format!(
                    "Summary:\n{}\n\nKey themes:\n{}\n\nDecisions:\n{}",
                    summary, themes, decisions
                ),
            ),
        )
        .await?;
    let strategy = steps
        .required(5, orchestrator.generate(&prompts::REFINE_STRATEGY, draft))
        .await?;

    let themes = list_items(&themes);
    let decisions = list_items(&decisions);
    let report = ReportText {
        title: &title,
        summary: &summary,
        themes: &themes,
        decisions: &decisions,
        strategy: &strategy,
    };

    let (document, deck) = tokio::join!(
        steps.optional(6, create_document(orchestrator, &report)),
        steps.optional(7, create_deck(orchestrator, &report)),
    );

    let result = json!({
        "title": title,
        "summary": summary,
        "themes": themes,
        "decisions": decisions,
        "strategy": strategy,
        "documentId": document.as_ref().map(|d| d.id.clone()),
        "documentUrl": document.as_ref().map(|d| d.url.clone()),
        "presentationId": deck.as_ref().map(|d| d.id.clone()),
        "presentationUrl": deck.as_ref().map(|d| d.url.clone()),
    });

    orchestrator
        .persist(steps, 8, JobKind::Report, &result)
        .await;
    Ok(result)
}

fn document_content(report: &ReportText<'_>) -> DocumentContent {
    DocumentContent::new()
        .title(report.title)
        .heading(1, "Summary")
        .markdown(report.summary)
        .heading(1, "Key Themes")
        .bullets(report.themes.iter().cloned())
        .heading(1, "Decisions")
        .bullets(report.decisions.iter().cloned())
        .markdown(report.strategy)
}

fn slides(report: &ReportText<'_>) -> Vec<Slide> {
    let strategy_headings: Vec<String> = parse_markdown(report.strategy)
        .into_iter()
        .filter_map(|block| match block {
            Block::Heading { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    let overview = report
        .summary
        .split("\n\n")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut slides = vec![
        Slide::title(report.title, "Strategy Report"),
        Slide::content("Summary", overview),
        Slide::content("Key Themes", report.themes.join("\n")),
        Slide::content("Decisions", report.decisions.join("\n")),
    ];
    if !strategy_headings.is_empty() {
        slides.push(Slide::content("Strategy", strategy_headings.join("\n")));
    }
    slides
}

async fn create_document(
    orchestrator: &Orchestrator,
    report: &ReportText<'_>,
) -> Result<Handle, Error> {
    orchestrator
        .documents()?
        .create(report.title, &document_content(report))
        .await
}

async fn create_deck(
    orchestrator: &Orchestrator,
    report: &ReportText<'_>,
) -> Result<DeckHandle, Error> {
    orchestrator
        .decks()?
        .build(report.title, &slides(report))
        .await
}
