//! Transcript acquisition: paginated, rate-limit aware fetching from the
//! transcript service plus the speaker run-length merge that turns raw
//! segments into readable paragraphs.

use crate::error::Error;
use log::*;
use meeting_ai::traits::transcript::Provider as TranscriptProvider;
use meeting_ai::types::transcript::{MeetingMetadata, Page, Segment};
use meeting_auth::http::{BackoffPolicy, RetryDecision, RetryPolicy};
use std::sync::Arc;
use std::time::SystemTime;

/// A fully fetched transcript, already merged by speaker.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub metadata: Option<MeetingMetadata>,
    pub text: String,
}

/// Extract the meeting id from the final non-empty path segment of a link.
///
/// Accepts absolute URLs (`https://host/meetings/abc123?x=1`) as well as bare
/// paths or ids.
pub fn meeting_id_from_link(link: &str) -> Result<String, Error> {
    let trimmed = link.trim();
    let path = match url::Url::parse(trimmed) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .ok_or_else(|| Error::validation(format!("no meeting id in transcript link '{}'", link)))
}

/// Merge consecutive segments from the same speaker and render one
/// `Speaker: text` paragraph per speaker turn.
pub fn merge_segments(segments: &[Segment]) -> String {
    let mut turns: Vec<(&str, String)> = Vec::new();

    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }
        match turns.last_mut() {
            Some((speaker, merged)) if *speaker == segment.speaker => {
                merged.push(' ');
                merged.push_str(text);
            }
            _ => turns.push((segment.speaker.as_str(), text.to_string())),
        }
    }

    turns
        .iter()
        .map(|(speaker, text)| format!("{}: {}", speaker, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Retrieves transcripts from a rate-limited upstream.
pub struct TranscriptFetcher {
    provider: Arc<dyn TranscriptProvider>,
    policy: BackoffPolicy,
}

impl TranscriptFetcher {
    pub fn new(provider: Arc<dyn TranscriptProvider>) -> Self {
        Self {
            provider,
            policy: BackoffPolicy::default(),
        }
    }

    /// Fetch every page of the meeting referenced by `link`.
    pub async fn fetch(&self, link: &str) -> Result<Transcript, Error> {
        let meeting_id = meeting_id_from_link(link)?;
        info!(
            "Fetching transcript for meeting {} from {}",
            meeting_id,
            self.provider.provider_id()
        );

        let mut metadata = None;
        let mut segments = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = self.fetch_page(&meeting_id, cursor.as_deref()).await?;
            pages += 1;
            if metadata.is_none() {
                metadata = page.metadata;
            }
            segments.extend(page.segments);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        debug!(
            "Fetched {} segments in {} pages for meeting {}",
            segments.len(),
            pages,
            meeting_id
        );

        Ok(Transcript {
            metadata,
            text: merge_segments(&segments),
        })
    }

    async fn fetch_page(&self, meeting_id: &str, cursor: Option<&str>) -> Result<Page, Error> {
        let start = SystemTime::now();
        let mut n_past_retries = 0;
        loop {
            let err = match self.provider.fetch_page(meeting_id, cursor).await {
                Ok(page) => return Ok(page),
                Err(err) if err.is_rate_limited() => err,
                Err(err) => {
                    warn!("Transcript fetch for meeting {} failed: {}", meeting_id, err);
                    return Err(err.into());
                }
            };

            match self.policy.should_retry(start, n_past_retries) {
                RetryDecision::Retry { execute_after } => {
                    let delay = execute_after
                        .duration_since(SystemTime::now())
                        .unwrap_or_default();
                    warn!(
                        "Transcript service rate limited (attempt {}/{}), retrying in {:?}",
                        n_past_retries + 1,
                        self.policy.max_attempts(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    n_past_retries += 1;
                }
                RetryDecision::DoNotRetry => {
                    warn!(
                        "Transcript service still rate limited after {} attempts",
                        n_past_retries + 1
                    );
                    return Err(err.into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, ExternalErrorKind, InternalErrorKind};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    type Reply = Result<Page, meeting_ai::Error>;

    struct ScriptedTranscripts {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<Vec<(Option<String>, Instant)>>,
    }

    impl ScriptedTranscripts {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Option<String>, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranscriptProvider for ScriptedTranscripts {
        async fn fetch_page(&self, _meeting_id: &str, cursor: Option<&str>) -> Reply {
            self.calls
                .lock()
                .unwrap()
                .push((cursor.map(str::to_string), Instant::now()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Page::default()))
        }

        fn provider_id(&self) -> &str {
            "scripted"
        }
    }

    fn rate_limited() -> Reply {
        Err(meeting_ai::Error::RateLimited {
            retry_after_seconds: 0,
        })
    }

    fn page(segments: Vec<Segment>, next_cursor: Option<&str>) -> Reply {
        Ok(Page {
            metadata: None,
            segments,
            next_cursor: next_cursor.map(str::to_string),
        })
    }

    #[test]
    fn merges_consecutive_speaker_segments() {
        let segments = vec![
            Segment::new("A", "hi"),
            Segment::new("A", "there"),
            Segment::new("B", "hello"),
        ];
        assert_eq!(merge_segments(&segments), "A: hi there\n\nB: hello");
    }

    #[test]
    fn speaker_label_repeats_only_on_change() {
        let segments = vec![
            Segment::new("A", "one"),
            Segment::new("B", "two"),
            Segment::new("A", "three"),
            Segment::new("A", " "),
            Segment::new("A", "four"),
        ];
        assert_eq!(
            merge_segments(&segments),
            "A: one\n\nB: two\n\nA: three four"
        );
    }

    #[test]
    fn meeting_id_is_last_path_segment() {
        assert_eq!(
            meeting_id_from_link("https://meet.example.com/recordings/abc123/").unwrap(),
            "abc123"
        );
        assert_eq!(
            meeting_id_from_link("https://meet.example.com/m/xyz?tab=transcript").unwrap(),
            "xyz"
        );
        assert_eq!(meeting_id_from_link("plain-id").unwrap(), "plain-id");
    }

    #[test]
    fn meeting_id_missing_is_validation_error() {
        let err = meeting_id_from_link("https://meet.example.com/").unwrap_err();
        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limit_twice_then_succeeds() {
        let provider = Arc::new(ScriptedTranscripts::new(vec![
            rate_limited(),
            rate_limited(),
            page(vec![Segment::new("A", "hi")], None),
        ]));
        let fetcher = TranscriptFetcher::new(provider.clone());

        let transcript = fetcher.fetch("https://host/meetings/m1").await.unwrap();

        assert_eq!(transcript.text, "A: hi");
        let calls = provider.calls();
        assert_eq!(calls.len(), 3);
        let first_gap = calls[1].1 - calls[0].1;
        let second_gap = calls[2].1 - calls[1].1;
        assert!(first_gap >= Duration::from_millis(990) && first_gap < Duration::from_millis(1100));
        assert!(second_gap >= Duration::from_millis(1990) && second_gap < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_rate_limited_attempts() {
        let provider = Arc::new(ScriptedTranscripts::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            page(vec![], None),
        ]));
        let fetcher = TranscriptFetcher::new(provider.clone());

        let err = fetcher.fetch("m1").await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::External(ExternalErrorKind::RateLimited)
        );
        assert_eq!(provider.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let provider = Arc::new(ScriptedTranscripts::new(vec![Err(
            meeting_ai::Error::NotFound("meeting m1".to_string()),
        )]));
        let fetcher = TranscriptFetcher::new(provider.clone());

        assert!(fetcher.fetch("m1").await.is_err());
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn follows_cursor_with_independent_retries_per_page() {
        let provider = Arc::new(ScriptedTranscripts::new(vec![
            page(vec![Segment::new("A", "hi")], Some("c2")),
            rate_limited(),
            rate_limited(),
            page(vec![Segment::new("A", "there")], Some("c3")),
            page(vec![Segment::new("B", "hello")], Some("")),
        ]));
        let fetcher = TranscriptFetcher::new(provider.clone());

        let transcript = fetcher.fetch("m1").await.unwrap();

        assert_eq!(transcript.text, "A: hi there\n\nB: hello");
        let cursors: Vec<Option<String>> = provider.calls().into_iter().map(|c| c.0).collect();
        assert_eq!(
            cursors,
            vec![
                None,
                Some("c2".to_string()),
                Some("c2".to_string()),
                Some("c2".to_string()),
                Some("c3".to_string()),
            ]
        );
    }
}
