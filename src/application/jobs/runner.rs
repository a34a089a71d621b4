//! Asynchronous job execution with a bounded queue and worker pool.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::model::{JobError, JobOutcome, JobSpec, JobState, JobStatus};
use crate::application::services::{AnalyticsService, BatchProgress, IngestService};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

type SharedStatus = Arc<RwLock<JobStatus>>;

struct QueuedJob {
    spec: JobSpec,
    status: SharedStatus,
}

/// Services a job may call.
#[derive(Clone)]
pub struct JobContext {
    pub ingest: Arc<IngestService>,
    pub analytics: Arc<AnalyticsService>,
}

/// Runner tunables, taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct JobRunnerSettings {
    pub queue_capacity: usize,
    pub worker_concurrency: usize,
    pub retention: Duration,
}

impl Default for JobRunnerSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            worker_concurrency: 2,
            retention: Duration::from_secs(3600),
        }
    }
}

/// Executes jobs outside the request path and tracks their status.
///
/// Each job gets one status record, written only by the task executing it
/// and read through [`JobRunner::status`]. Jobs run exactly once; failures
/// are not retried. A job whose task dies mid-flight keeps its last
/// reported state.
pub struct JobRunner {
    jobs: RwLock<HashMap<Uuid, SharedStatus>>,
    queue: mpsc::Sender<QueuedJob>,
    retention: chrono::Duration,
    stop: CancellationToken,
    workers: TaskTracker,
}

impl JobRunner {
    /// Creates the runner and spawns its dispatcher.
    pub fn start(context: JobContext, settings: JobRunnerSettings) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(settings.queue_capacity.max(1));
        let retention = chrono::Duration::from_std(settings.retention)
            .unwrap_or_else(|_| chrono::Duration::hours(1));

        let runner = Arc::new(Self {
            jobs: RwLock::new(HashMap::new()),
            queue: tx,
            retention,
            stop: CancellationToken::new(),
            workers: TaskTracker::new(),
        });

        let semaphore = Arc::new(Semaphore::new(settings.worker_concurrency.max(1)));
        runner.workers.spawn(dispatch(
            rx,
            context,
            semaphore,
            runner.workers.clone(),
            runner.stop.clone(),
        ));

        info!(
            queue_capacity = settings.queue_capacity,
            workers = settings.worker_concurrency,
            "Job runner started"
        );

        runner
    }

    /// Enqueues a job and returns its initial `PENDING` status.
    ///
    /// Never waits for the job to run.
    ///
    /// # Errors
    ///
    /// - [`JobError::QueueFull`] if the pending buffer is full
    /// - [`JobError::ShuttingDown`] after [`Self::shutdown`]
    pub fn submit(&self, spec: JobSpec) -> Result<JobStatus, JobError> {
        if self.stop.is_cancelled() {
            return Err(JobError::ShuttingDown);
        }

        self.prune();

        let job_id = Uuid::new_v4();
        let initial = JobStatus::pending(job_id, &spec);
        let status = Arc::new(RwLock::new(initial.clone()));

        self.jobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(job_id, status.clone());

        let kind = spec.kind();
        if let Err(e) = self.queue.try_send(QueuedJob { spec, status }) {
            self.jobs
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&job_id);

            return Err(match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!(kind, "Job queue full, rejecting job");
                    JobError::QueueFull
                }
                mpsc::error::TrySendError::Closed(_) => JobError::ShuttingDown,
            });
        }

        metrics::counter!("jobs_submitted_total").increment(1);
        info!(job_id = %job_id, kind, "Job submitted");

        Ok(initial)
    }

    /// Returns a snapshot of the job's status, or `None` for an unknown id.
    pub fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
        jobs.get(&job_id)
            .map(|status| status.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    /// Number of free slots in the pending buffer.
    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// True while the runner accepts jobs.
    pub fn is_running(&self) -> bool {
        !self.stop.is_cancelled() && !self.queue.is_closed()
    }

    /// Stops accepting jobs and waits (bounded) for running ones to finish.
    ///
    /// Jobs still queued stay `PENDING`.
    pub async fn shutdown(&self) {
        self.stop.cancel();
        self.workers.close();

        if tokio::time::timeout(SHUTDOWN_GRACE, self.workers.wait())
            .await
            .is_err()
        {
            warn!("Timed out waiting for running jobs");
        }

        info!("Job runner stopped");
    }

    /// Drops terminal records older than the retention window.
    fn prune(&self) {
        let cutoff = Utc::now() - self.retention;
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let before = jobs.len();

        jobs.retain(|_, status| {
            let status = status.read().unwrap_or_else(|e| e.into_inner());
            !(status.state.is_terminal() && status.finished_at.is_some_and(|t| t < cutoff))
        });

        let pruned = before - jobs.len();
        if pruned > 0 {
            debug!(pruned, "Pruned finished jobs");
        }
    }
}

async fn dispatch(
    mut rx: mpsc::Receiver<QueuedJob>,
    context: JobContext,
    semaphore: Arc<Semaphore>,
    workers: TaskTracker,
    stop: CancellationToken,
) {
    loop {
        let job = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            job = rx.recv() => job,
        };

        let Some(job) = job else { break };

        let permit = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            permit = semaphore.clone().acquire_owned() => permit,
        };

        let Ok(permit) = permit else { break };

        let context = context.clone();
        workers.spawn(async move {
            execute(job, &context).await;
            drop(permit);
        });
    }

    debug!("Job dispatcher stopped");
}

async fn execute(job: QueuedJob, context: &JobContext) {
    let QueuedJob { spec, status } = job;

    let job_id = {
        let mut s = status.write().unwrap_or_else(|e| e.into_inner());
        s.start();
        s.job_id
    };

    info!(job_id = %job_id, kind = spec.kind(), "Job started");

    let result = match spec {
        JobSpec::FetchTopItems { limit } => {
            let progress_status = status.clone();
            context
                .ingest
                .ingest_batch_with_progress(limit, move |p: BatchProgress| {
                    progress_status
                        .write()
                        .unwrap_or_else(|e| e.into_inner())
                        .report_progress(
                            p.percent(),
                            format!("Processed {} of {} items", p.handled, p.total),
                        );
                })
                .await
                .map(|batch| {
                    let message = format!(
                        "Stored {} new items ({} unseen of {} fetched)",
                        batch.processed_count, batch.new_count, batch.total_fetched
                    );
                    (JobOutcome::Batch(batch), message)
                })
                .map_err(|e| e.to_string())
        }
        JobSpec::RefreshSummary => context
            .analytics
            .refresh_summary()
            .await
            .map(|report| {
                let message = format!(
                    "{} items, {} keywords, {} domains",
                    report.summary.total_items,
                    report.summary.total_keywords,
                    report.summary.total_domains
                );
                (JobOutcome::Summary(report), message)
            })
            .map_err(|e| e.to_string()),
    };

    let mut s = status.write().unwrap_or_else(|e| e.into_inner());
    match result {
        Ok((outcome, message)) => {
            info!(job_id = %job_id, "Job succeeded: {}", message);
            s.succeed(outcome, message);
        }
        Err(e) => {
            error!(job_id = %job_id, "Job failed: {}", e);
            s.fail(e);
        }
    }

    metrics::counter!("jobs_finished_total", "state" => s.state.as_str()).increment(1);
}
