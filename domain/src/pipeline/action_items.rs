//! The action items pipeline.
//!
//! ```text
//! 0 transcript -> 1 extract -> {2 owners, 3 deadlines} -> 4 prioritize (JSON)
//!              -> 5 summary -> 6 review -> 7 document -> 8 save
//! ```
//!
//! Unlike the report, the document is the deliverable here, so step 7 is
//! required.

use super::{prompts, Orchestrator, Steps, TranscriptSource};
use crate::document::DocumentContent;
use crate::error::Error;
use crate::progress::JobKind;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DEFAULT_TITLE: &str = "Meeting Action Items";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub action: String,
    #[serde(default = "unassigned")]
    pub owner: String,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default = "medium")]
    pub priority: String,
}

fn unassigned() -> String {
    "Unassigned".to_string()
}

fn medium() -> String {
    "medium".to_string()
}

/// Parse the prioritization step's JSON array, tolerating code fences and
/// prose around it.
pub fn parse_action_items(text: &str) -> Result<Vec<ActionItem>, Error> {
    let start = text.find('[');
    let end = text.rfind(']');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(Error::other(
                "prioritized action items did not contain a JSON array",
            ))
        }
    };
    let items: Vec<ActionItem> = serde_json::from_str(json)?;
    Ok(items
        .into_iter()
        .filter(|item| !item.action.trim().is_empty())
        .collect())
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

    let extracted = steps
        .required(
            1,
            orchestrator.generate(&prompts::EXTRACT_ACTION_ITEMS, text),
        )
        .await?;

    let with_context = format!("Action items:\n{}\n\nTranscript:\n{}", extracted, text);
    let (owners, deadlines) = tokio::try_join!(
        steps.required(
            2,
            orchestrator.generate(&prompts::IDENTIFY_OWNERS, with_context.as_str())
        ),
        steps.required(
            3,
            orchestrator.generate(&prompts::IDENTIFY_DEADLINES, with_context.as_str())
        ),
    )?;

    let items = steps
        .required(4, async {
            let prioritized = orchestrator
                .generate(
                    &prompts::PRIORITIZE_ACTION_ITEMS,
                    format!(
                        "Action items:\n{}\n\nOwners:\n{}\n\nDeadlines:\n{}",
                        extracted, owners, deadlines
                    ),
                )
                .await?;
            parse_action_items(&prioritized)
        })
        .await?;
    debug!("Prioritized {} action items", items.len());

    let items_json = serde_json::to_string_pretty(&items)?;
    let summary = steps
        .required(
            5,
            orchestrator.generate(
                &prompts::SUMMARIZE_ACTION_ITEMS,
                format!("Action items:\n{}\n\nTranscript:\n{}", items_json, text),
            ),
        )
        .await?;
    let summary = steps
        .required(
            6,
            orchestrator.generate(
                &prompts::REVIEW_REPORT,
                format!("Summary:\n{}\n\nAction items:\n{}", summary, items_json),
            ),
        )
        .await?;

    let document = steps
        .required(7, async {
            orchestrator
                .documents()?
                .create(&title, &document_content(&title, &summary, &items))
                .await
        })
        .await?;

    let result = json!({
        "title": title,
        "summary": summary,
        "items": items,
        "documentId": document.id,
        "documentUrl": document.url,
    });

    orchestrator
        .persist(steps, 8, JobKind::ActionItems, &result)
        .await;
    Ok(result)
}

fn document_content(title: &str, summary: &str, items: &[ActionItem]) -> DocumentContent {
    let mut rows = vec![vec![
        "Action".to_string(),
        "Owner".to_string(),
        "Deadline".to_string(),
        "Priority".to_string(),
    ]];
    rows.extend(items.iter().map(|item| {
        vec![
            item.action.clone(),
            item.owner.clone(),
            item.deadline.clone().unwrap_or_default(),
            item.priority.clone(),
        ]
    }));

    DocumentContent::new()
        .title(title)
        .heading(1, "Summary")
        .markdown(summary)
        .heading(1, "Action Items")
        .table(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::assembler::tests::FakeDocument;
    use crate::document::DocumentAssembler;
    use crate::pipeline::tests::RecordingStore;
    use crate::progress::{InMemoryProgressStore, JobStatus, ProgressStore};
    use meeting_ai::traits::generation::MockProvider;
    use meeting_ai::types::document::Request;
    use meeting_ai::GenerationRequest;
    use std::sync::Arc;

    const PRIORITIZED: &str = r#"```json
[
  {"action": "Ship the beta", "owner": "Ana", "deadline": "Friday", "priority": "high"},
  {"action": "Book venue", "owner": "Bo", "deadline": null, "priority": "low"}
]
```"#;

    fn canned(request: &GenerationRequest) -> Result<String, meeting_ai::Error> {
        let instructions = request.system_instructions.as_str();
        let text = if instructions == prompts::EXTRACT_ACTION_ITEMS.instructions {
            "- Ship the beta\n- Book venue"
        } else if instructions == prompts::IDENTIFY_OWNERS.instructions {
            "- Ship the beta: Ana\n- Book venue: Bo"
        } else if instructions == prompts::IDENTIFY_DEADLINES.instructions {
            "- Ship the beta: Friday\n- Book venue: None"
        } else if instructions == prompts::PRIORITIZE_ACTION_ITEMS.instructions {
            PRIORITIZED
        } else if instructions == prompts::SUMMARIZE_ACTION_ITEMS.instructions {
            "Draft summary."
        } else {
            "Two tasks agreed. Ana ships the beta by Friday."
        };
        Ok(text.to_string())
    }

    fn orchestrator(
        progress: Arc<InMemoryProgressStore>,
        generator: MockProvider,
        documents: Option<Arc<FakeDocument>>,
        store: Arc<RecordingStore>,
    ) -> Orchestrator {
        let orchestrator = Orchestrator::new(progress, Arc::new(generator), store);
        match documents {
            Some(documents) => orchestrator.with_documents(DocumentAssembler::new(documents)),
            None => orchestrator,
        }
    }

    #[test]
    fn parses_fenced_json_with_defaults() {
        let items = parse_action_items(
            "Here you go:\n[{\"action\": \"Call vendor\"}, {\"action\": \" \"}]\nThanks",
        )
        .unwrap();
        assert_eq!(
            items,
            vec![ActionItem {
                action: "Call vendor".to_string(),
                owner: "Unassigned".to_string(),
                deadline: None,
                priority: "medium".to_string(),
            }]
        );
        assert!(parse_action_items("no list here").is_err());
    }

    #[tokio::test]
    async fn action_items_job_builds_the_table_document() {
        let progress = Arc::new(InMemoryProgressStore::new());
        let documents = Arc::new(FakeDocument::new(100));
        let store = Arc::new(RecordingStore::default());
        let mut generator = MockProvider::new();
        generator
            .expect_generate()
            .times(6)
            .returning(|request| canned(&request));
        let orchestrator = orchestrator(
            progress.clone(),
            generator,
            Some(documents.clone()),
            store.clone(),
        );

        progress.init("job-1", JobKind::ActionItems).await;
        orchestrator
            .run(
                "job-1",
                JobKind::ActionItems,
                TranscriptSource::Direct("A: ship it".to_string()),
                Some("Launch sync".to_string()),
            )
            .await;

        let snapshot = progress.get("job-1").await.unwrap();
        assert_eq!(snapshot.job.status, JobStatus::Completed);
        assert_eq!(snapshot.percentage, 100);

        let result = snapshot.job.result.unwrap();
        assert_eq!(result["items"][0]["owner"], "Ana");
        assert!(result["items"][1]["deadline"].is_null());
        assert_eq!(
            result["summary"],
            "Two tasks agreed. Ana ships the beta by Friday."
        );
        assert_eq!(result["documentId"], "doc-Launch sync");

        // Header row plus two items, four columns; one deadline is empty.
        let structure = documents.structure();
        let table = structure.tables().next().unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 4);
        let cell_inserts = documents
            .batches
            .lock()
            .unwrap()
            .iter()
            .find(|batch| batch.len() == 11)
            .cloned()
            .unwrap();
        assert!(cell_inserts
            .iter()
            .all(|r| matches!(r, Request::InsertText { .. })));
        assert_eq!(table.rows[1][1].text, "Ana\n");

        let upserts = store.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].0, "action_items");
    }

    #[tokio::test]
    async fn malformed_priorities_fail_the_job() {
        let progress = Arc::new(InMemoryProgressStore::new());
        let store = Arc::new(RecordingStore::default());
        let mut generator = MockProvider::new();
        generator.expect_generate().returning(|request| {
            if request.system_instructions == prompts::PRIORITIZE_ACTION_ITEMS.instructions {
                Ok("I could not prioritize these.".to_string())
            } else {
                canned(&request)
            }
        });
        let orchestrator = orchestrator(
            progress.clone(),
            generator,
            Some(Arc::new(FakeDocument::new(100))),
            store.clone(),
        );

        progress.init("job-2", JobKind::ActionItems).await;
        orchestrator
            .run(
                "job-2",
                JobKind::ActionItems,
                TranscriptSource::Direct("A: ship it".to_string()),
                None,
            )
            .await;

        let snapshot = progress.get("job-2").await.unwrap();
        assert_eq!(snapshot.job.status, JobStatus::Failed);
        assert!(snapshot
            .job
            .error
            .unwrap()
            .starts_with("Prioritizing action items: "));
        assert!(store.upserts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_document_service_fails_the_document_step() {
        let progress = Arc::new(InMemoryProgressStore::new());
        let store = Arc::new(RecordingStore::default());
        let mut generator = MockProvider::new();
        generator
            .expect_generate()
            .returning(|request| canned(&request));
        let orchestrator = orchestrator(progress.clone(), generator, None, store.clone());

        progress.init("job-3", JobKind::ActionItems).await;
        orchestrator
            .run(
                "job-3",
                JobKind::ActionItems,
                TranscriptSource::Direct("A: ship it".to_string()),
                None,
            )
            .await;

        let snapshot = progress.get("job-3").await.unwrap();
        assert_eq!(snapshot.job.status, JobStatus::Failed);
        assert!(snapshot
            .job
            .error
            .unwrap()
            .starts_with("Creating action items document: "));
        assert_eq!(snapshot.job.current_step, 7);
        assert!(store.upserts.lock().unwrap().is_empty());
    }
}
