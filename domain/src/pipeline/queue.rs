//! Bounded job queue drained by a fixed pool of workers.
//!
//! Submitting validates the request, claims a queue slot, records the job as
//! `pending` and returns its id immediately; a worker picks it up later and
//! drives it to a terminal status. A full queue rejects the submission before
//! anything is recorded.

use super::{JobRequest, Orchestrator, TranscriptSource};
use crate::error::Error;
use crate::progress::{new_job_id, JobKind, StatusUpdate};
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug)]
struct QueuedJob {
    id: String,
    kind: JobKind,
    source: TranscriptSource,
    title: Option<String>,
}

#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<QueuedJob>,
    orchestrator: Arc<Orchestrator>,
    capacity: usize,
}

pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl JobQueue {
    /// Start `worker_count` workers reading from a queue of `capacity` jobs.
    pub fn start(
        orchestrator: Arc<Orchestrator>,
        worker_count: usize,
        capacity: usize,
    ) -> (Self, WorkerPool) {
        let (sender, receiver) = mpsc::channel::<QueuedJob>(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count.max(1))
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let orchestrator = Arc::clone(&orchestrator);
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(job) = next else {
                            debug!("Worker {} stopping, queue closed", worker);
                            break;
                        };
                        debug!("Worker {} picked up job {}", worker, job.id);
                        run_isolated(Arc::clone(&orchestrator), job).await;
                    }
                })
            })
            .collect();

        info!(
            "Started {} pipeline workers (queue capacity {})",
            worker_count.max(1),
            capacity.max(1)
        );
        (
            Self {
                sender,
                orchestrator,
                capacity: capacity.max(1),
            },
            WorkerPool { workers },
        )
    }

    /// Validate, reserve a queue slot, record and enqueue a job. Never waits:
    /// a full queue is reported as [`Error::queue_full`] and no job is created.
    pub async fn submit(&self, kind: JobKind, request: JobRequest) -> Result<String, Error> {
        let source = request.source()?;
        let permit = self.sender.try_reserve().map_err(|e| match e {
            TrySendError::Full(()) => {
                warn!("Rejecting {} job, queue is full", kind);
                Error::queue_full(self.capacity)
            }
            TrySendError::Closed(()) => Error::other("job queue is closed"),
        })?;

        let id = new_job_id();
        self.orchestrator.progress().init(&id, kind).await;
        permit.send(QueuedJob {
            id: id.clone(),
            kind,
            source,
            title: request.title(),
        });
        info!("Queued {} job {}", kind, id);
        Ok(id)
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }
}

/// Run one job on its own task so a panic fails that job and leaves the
/// worker alive.
async fn run_isolated(orchestrator: Arc<Orchestrator>, job: QueuedJob) {
    let QueuedJob {
        id,
        kind,
        source,
        title,
    } = job;
    let progress = orchestrator.progress();
    let job_id = id.clone();
    let handle = tokio::spawn(async move {
        orchestrator.run(&job_id, kind, source, title).await;
    });

    if let Err(e) = handle.await {
        error!("Job {} aborted: {}", id, e);
        if let Err(e) = progress
            .set_status(&id, StatusUpdate::failed("job aborted unexpectedly"))
            .await
        {
            warn!("Job {} final status not recorded: {}", id, e);
        }
    }
}

impl WorkerPool {
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Wait for every worker to exit; they exit once all queue handles are dropped.
    pub async fn join(self) {
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!("Pipeline worker ended abnormally: {}", e);
            }
        }
    }

    pub fn abort(&self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};
    use crate::pipeline::tests::RecordingStore;
    use crate::progress::{InMemoryProgressStore, JobStatus, ProgressStore};
    use async_trait::async_trait;
    use meeting_ai::traits::generation::{MockProvider, Provider as GenerationProvider};
    use meeting_ai::GenerationRequest;

    /// Never answers, so the job holding the worker stays in flight.
    struct StalledGenerator;

    #[async_trait]
    impl GenerationProvider for StalledGenerator {
        async fn generate(&self, _request: GenerationRequest) -> Result<String, meeting_ai::Error> {
            std::future::pending().await
        }

        fn provider_id(&self) -> &str {
            "stalled"
        }
    }

    /// Panics on transcripts mentioning "boom", answers everything else.
    struct PanickyGenerator;

    #[async_trait]
    impl GenerationProvider for PanickyGenerator {
        async fn generate(&self, request: GenerationRequest) -> Result<String, meeting_ai::Error> {
            if request.user_content.contains("boom") {
                panic!("generator crashed");
            }
            Ok("- point".to_string())
        }

        fn provider_id(&self) -> &str {
            "panicky"
        }
    }

    fn direct(text: &str) -> JobRequest {
        JobRequest {
            transcript: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn orchestrator(progress: Arc<InMemoryProgressStore>) -> Arc<Orchestrator> {
        let mut generator = MockProvider::new();
        generator
            .expect_generate()
            .returning(|_| Ok("- point".to_string()));
        Arc::new(Orchestrator::new(
            progress,
            Arc::new(generator),
            Arc::new(RecordingStore::default()),
        ))
    }

    #[tokio::test]
    async fn missing_input_is_rejected_before_a_job_exists() {
        let progress = Arc::new(InMemoryProgressStore::new());
        let (queue, _pool) = JobQueue::start(orchestrator(progress.clone()), 1, 4);

        let err = queue
            .submit(JobKind::Report, JobRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(_))
        ));
        assert!(progress.is_empty());
    }

    #[tokio::test]
    async fn submitted_jobs_run_to_completion() {
        let progress = Arc::new(InMemoryProgressStore::new());
        let (queue, pool) = JobQueue::start(orchestrator(progress.clone()), 2, 4);
        assert_eq!(pool.len(), 2);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let request = JobRequest {
                transcript: Some("A: hi".to_string()),
                ..Default::default()
            };
            let id = queue.submit(JobKind::Report, request).await.unwrap();
            assert!(progress.get(&id).await.is_some());
            ids.push(id);
        }

        drop(queue);
        pool.join().await;

        for id in ids {
            let snapshot = progress.get(&id).await.unwrap();
            assert_eq!(snapshot.job.status, JobStatus::Completed);
            assert_eq!(snapshot.percentage, 100);
        }
    }

    #[tokio::test]
    async fn full_queue_rejects_without_recording_a_job() {
        let progress = Arc::new(InMemoryProgressStore::new());
        let orchestrator = Arc::new(Orchestrator::new(
            progress.clone(),
            Arc::new(StalledGenerator),
            Arc::new(RecordingStore::default()),
        ));
        let (queue, pool) = JobQueue::start(orchestrator, 1, 1);

        // The only worker takes the first job and stalls on it.
        let first = queue.submit(JobKind::Report, direct("A: one")).await.unwrap();
        while progress.get(&first).await.unwrap().job.status != JobStatus::Processing {
            tokio::task::yield_now().await;
        }

        // The second job fills the single slot; the third has nowhere to go.
        queue
            .submit(JobKind::Report, direct("A: two"))
            .await
            .unwrap();
        let err = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            queue.submit(JobKind::Report, direct("A: three")),
        )
        .await
        .expect("submit must not wait for queue space")
        .unwrap_err();

        assert!(matches!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::QueueFull)
        ));
        assert_eq!(progress.len(), 2);
        pool.abort();
    }

    #[tokio::test]
    async fn panicking_job_fails_and_worker_keeps_going() {
        let progress = Arc::new(InMemoryProgressStore::new());
        let orchestrator = Arc::new(Orchestrator::new(
            progress.clone(),
            Arc::new(PanickyGenerator),
            Arc::new(RecordingStore::default()),
        ));
        let (queue, pool) = JobQueue::start(orchestrator, 1, 4);

        let crashed = queue
            .submit(JobKind::Report, direct("A: boom"))
            .await
            .unwrap();
        let healthy = queue
            .submit(JobKind::Report, direct("A: fine"))
            .await
            .unwrap();

        drop(queue);
        pool.join().await;

        let crashed = progress.get(&crashed).await.unwrap();
        assert_eq!(crashed.job.status, JobStatus::Failed);
        assert_eq!(crashed.job.error.as_deref(), Some("job aborted unexpectedly"));
        let healthy = progress.get(&healthy).await.unwrap();
        assert_eq!(healthy.job.status, JobStatus::Completed);
    }
}
