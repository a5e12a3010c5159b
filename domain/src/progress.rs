//! Job progress tracking.
//!
//! Every job owns a fixed, ordered list of named steps chosen by its [`JobKind`].
//! The orchestrator reports step boundaries here while pollers read snapshots
//! concurrently. [`InMemoryProgressStore`] keeps one record per job inside a
//! `DashMap`, so every mutation runs under that record's shard lock.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

const REPORT_STEPS: [&str; 9] = [
    "Fetching transcript",
    "Summarizing discussion",
    "Extracting key themes",
    "Capturing decisions",
    "Drafting strategy",
    "Refining strategy",
    "Creating strategy document",
    "Creating presentation",
    "Saving report",
];

const ACTION_ITEM_STEPS: [&str; 9] = [
    "Fetching transcript",
    "Extracting action items",
    "Identifying owners",
    "Identifying deadlines",
    "Prioritizing action items",
    "Writing summary",
    "Reviewing report",
    "Creating action items document",
    "Saving action items",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobKind {
    Report,
    ActionItems,
}

impl JobKind {
    pub fn step_names(&self) -> &'static [&'static str] {
        match self {
            JobKind::Report => &REPORT_STEPS,
            JobKind::ActionItems => &ACTION_ITEM_STEPS,
        }
    }

    /// Logical persistence table holding this kind's results.
    pub fn table(&self) -> &'static str {
        match self {
            JobKind::Report => "reports",
            JobKind::ActionItems => "action_items",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Report => write!(f, "report"),
            JobKind::ActionItems => write!(f, "actionItems"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub steps: Vec<Step>,
    pub current_step: usize,
    pub error: Option<String>,
    pub result: Option<Value>,
    pub started_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
            status: JobStatus::Pending,
            steps: kind
                .step_names()
                .iter()
                .map(|name| Step {
                    name: name.to_string(),
                    completed: false,
                })
                .collect(),
            current_step: 0,
            error: None,
            result: None,
            started_at: Utc::now(),
        }
    }

    pub fn percentage(&self) -> u8 {
        if self.steps.is_empty() {
            return 0;
        }
        let completed = self.steps.iter().filter(|s| s.completed).count();
        ((100.0 * completed as f64) / self.steps.len() as f64).round() as u8
    }
}

/// Read-only view returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    #[serde(flatten)]
    pub job: Job,
    pub percentage: u8,
}

impl From<Job> for ProgressSnapshot {
    fn from(job: Job) -> Self {
        let percentage = job.percentage();
        Self { job, percentage }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProgressError {
    NotFound,
    InvalidTransition { from: JobStatus, to: JobStatus },
    StepOutOfRange { index: usize, len: usize },
}

impl fmt::Display for ProgressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressError::NotFound => write!(f, "job not found"),
            ProgressError::InvalidTransition { from, to } => {
                write!(f, "invalid status transition {:?} -> {:?}", from, to)
            }
            ProgressError::StepOutOfRange { index, len } => {
                write!(f, "step index {} out of range for {} steps", index, len)
            }
        }
    }
}

impl std::error::Error for ProgressError {}

/// Terminal and intermediate status changes.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub error: Option<String>,
    pub result: Option<Value>,
}

impl StatusUpdate {
    pub fn processing() -> Self {
        Self {
            status: JobStatus::Processing,
            error: None,
            result: None,
        }
    }

    pub fn completed(result: Value) -> Self {
        Self {
            status: JobStatus::Completed,
            error: None,
            result: Some(result),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            error: Some(error.into()),
            result: None,
        }
    }
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Create the step list for `kind` with status `pending`. An existing record
    /// with the same id is replaced.
    async fn init(&self, job_id: &str, kind: JobKind);

    /// Mark a step running (`completed = false`) or done (`completed = true`).
    async fn update(
        &self,
        job_id: &str,
        step_index: usize,
        completed: bool,
    ) -> Result<(), ProgressError>;

    async fn set_status(&self, job_id: &str, update: StatusUpdate) -> Result<(), ProgressError>;

    /// `None` for unknown or evicted ids.
    async fn get(&self, job_id: &str) -> Option<ProgressSnapshot>;

    /// Drop every job started longer than `max_age` ago; returns how many were removed.
    async fn sweep(&self, max_age: Duration) -> usize;
}

/// Generate a fresh job id.
pub fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    jobs: DashMap<String, Job>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn sweep_at(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let cutoff = now - max_age;
        let before = self.jobs.len();
        self.jobs.retain(|_, job| job.started_at >= cutoff);
        before.saturating_sub(self.jobs.len())
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn init(&self, job_id: &str, kind: JobKind) {
        debug!("Initializing {} job {}", kind, job_id);
        self.jobs.insert(job_id.to_string(), Job::new(job_id, kind));
    }

    async fn update(
        &self,
        job_id: &str,
        step_index: usize,
        completed: bool,
    ) -> Result<(), ProgressError> {
        let mut job = self.jobs.get_mut(job_id).ok_or(ProgressError::NotFound)?;
        let len = job.steps.len();
        let step = job
            .steps
            .get_mut(step_index)
            .ok_or(ProgressError::StepOutOfRange {
                index: step_index,
                len,
            })?;
        step.completed = completed;
        if completed {
            job.current_step = job.current_step.max(step_index + 1);
        }
        Ok(())
    }

    async fn set_status(&self, job_id: &str, update: StatusUpdate) -> Result<(), ProgressError> {
        let mut job = self.jobs.get_mut(job_id).ok_or(ProgressError::NotFound)?;
        if !job.status.can_transition_to(update.status) {
            return Err(ProgressError::InvalidTransition {
                from: job.status,
                to: update.status,
            });
        }
        job.status = update.status;
        if update.error.is_some() {
            job.error = update.error;
        }
        if update.result.is_some() {
            job.result = update.result;
        }
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Option<ProgressSnapshot> {
        self.jobs
            .get(job_id)
            .map(|job| ProgressSnapshot::from(job.value().clone()))
    }

    async fn sweep(&self, max_age: Duration) -> usize {
        self.sweep_at(Utc::now(), max_age)
    }
}

/// Periodically evicts old jobs until the returned handle is aborted.
pub fn spawn_sweeper(
    store: Arc<dyn ProgressStore>,
    interval: std::time::Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.sweep(max_age).await;
            if removed > 0 {
                info!("Swept {} expired jobs from the progress store", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_before_init_is_not_found() {
        let store = InMemoryProgressStore::new();
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn init_creates_nine_incomplete_steps() {
        let store = InMemoryProgressStore::new();
        store.init("job-1", JobKind::Report).await;

        let snapshot = store.get("job-1").await.unwrap();
        assert_eq!(snapshot.job.status, JobStatus::Pending);
        assert_eq!(snapshot.job.steps.len(), 9);
        assert!(snapshot.job.steps.iter().all(|s| !s.completed));
        assert_eq!(snapshot.percentage, 0);
        assert_eq!(snapshot.job.steps[0].name, "Fetching transcript");
    }

    #[tokio::test]
    async fn step_names_differ_by_kind() {
        assert_eq!(JobKind::Report.step_names().len(), 9);
        assert_eq!(JobKind::ActionItems.step_names().len(), 9);
        assert_eq!(JobKind::ActionItems.step_names()[8], "Saving action items");
        assert_eq!(JobKind::Report.step_names()[8], "Saving report");
    }

    #[tokio::test]
    async fn current_step_and_percentage_never_decrease() {
        let store = InMemoryProgressStore::new();
        store.init("job-1", JobKind::ActionItems).await;

        let mut last_step = 0;
        let mut last_percentage = 0;
        for index in 0..9 {
            store.update("job-1", index, false).await.unwrap();
            store.update("job-1", index, true).await.unwrap();
            let snapshot = store.get("job-1").await.unwrap();
            assert!(snapshot.job.current_step >= last_step);
            assert!(snapshot.percentage >= last_percentage);
            assert!(snapshot.percentage <= 100);
            last_step = snapshot.job.current_step;
            last_percentage = snapshot.percentage;
        }
        assert_eq!(last_step, 9);
        assert_eq!(last_percentage, 100);
    }

    #[tokio::test]
    async fn marking_running_does_not_rewind_current_step() {
        let store = InMemoryProgressStore::new();
        store.init("job-1", JobKind::Report).await;
        store.update("job-1", 3, true).await.unwrap();
        store.update("job-1", 1, false).await.unwrap();

        let snapshot = store.get("job-1").await.unwrap();
        assert_eq!(snapshot.job.current_step, 4);
        assert_eq!(snapshot.percentage, 11);
    }

    #[tokio::test]
    async fn update_rejects_unknown_job_and_bad_index() {
        let store = InMemoryProgressStore::new();
        assert_eq!(
            store.update("nope", 0, true).await,
            Err(ProgressError::NotFound)
        );

        store.init("job-1", JobKind::Report).await;
        assert_eq!(
            store.update("job-1", 9, true).await,
            Err(ProgressError::StepOutOfRange { index: 9, len: 9 })
        );
    }

    #[tokio::test]
    async fn status_follows_the_lifecycle() {
        let store = InMemoryProgressStore::new();
        store.init("job-1", JobKind::Report).await;

        assert_eq!(
            store
                .set_status("job-1", StatusUpdate::completed(Value::Null))
                .await,
            Err(ProgressError::InvalidTransition {
                from: JobStatus::Pending,
                to: JobStatus::Completed
            })
        );

        store
            .set_status("job-1", StatusUpdate::processing())
            .await
            .unwrap();
        store
            .set_status("job-1", StatusUpdate::failed("Drafting strategy: boom"))
            .await
            .unwrap();

        let snapshot = store.get("job-1").await.unwrap();
        assert_eq!(snapshot.job.status, JobStatus::Failed);
        assert_eq!(
            snapshot.job.error.as_deref(),
            Some("Drafting strategy: boom")
        );

        assert!(store
            .set_status("job-1", StatusUpdate::processing())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn sweep_evicts_only_old_jobs() {
        let store = InMemoryProgressStore::new();
        store.init("old", JobKind::Report).await;
        store.init("fresh", JobKind::Report).await;
        store.jobs.get_mut("old").unwrap().started_at = Utc::now() - Duration::hours(2);

        let removed = store.sweep(Duration::hours(1)).await;

        assert_eq!(removed, 1);
        assert!(store.get("old").await.is_none());
        assert!(store.get("fresh").await.is_some());
    }

    #[test]
    fn snapshot_serializes_camel_case_with_percentage() {
        let mut job = Job::new("job-1", JobKind::ActionItems);
        job.steps[0].completed = true;
        let json = serde_json::to_value(ProgressSnapshot::from(job)).unwrap();

        assert_eq!(json["kind"], "actionItems");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["currentStep"], 0);
        assert_eq!(json["percentage"], 11);
        assert!(json.get("startedAt").is_some());
    }
}
