//! Job specifications, states and status records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::{BatchResult, SummaryReport};

/// Lifecycle state of a job.
///
/// `PENDING -> PROGRESS -> SUCCESS | FAILURE`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Progress,
    Success,
    Failure,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Progress => "PROGRESS",
            JobState::Success => "SUCCESS",
            JobState::Failure => "FAILURE",
        }
    }
}

/// What a job should do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobSpec {
    /// One ingestion batch; `None` uses the configured default limit.
    FetchTopItems {
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Recompute the analytics summary.
    RefreshSummary,
}

impl JobSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            JobSpec::FetchTopItems { .. } => "fetch_top_items",
            JobSpec::RefreshSummary => "refresh_summary",
        }
    }
}

/// Result carried by a successful job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JobOutcome {
    Batch(BatchResult),
    Summary(SummaryReport),
}

/// Point-in-time view of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub job_id: Uuid,
    pub kind: &'static str,
    pub state: JobState,
    /// 0-100, floor of handled/total.
    pub progress_percent: u8,
    pub status_message: String,
    pub result: Option<JobOutcome>,
    pub error: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub(crate) fn pending(job_id: Uuid, spec: &JobSpec) -> Self {
        Self {
            job_id,
            kind: spec.kind(),
            state: JobState::Pending,
            progress_percent: 0,
            status_message: "Job queued".to_string(),
            result: None,
            error: None,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub(crate) fn start(&mut self) {
        self.state = JobState::Progress;
        self.started_at = Some(Utc::now());
        self.status_message = "Job started".to_string();
    }

    pub(crate) fn report_progress(&mut self, percent: u8, message: String) {
        // Terminal records are final.
        if self.state.is_terminal() {
            return;
        }
        self.state = JobState::Progress;
        self.progress_percent = percent.min(100);
        self.status_message = message;
    }

    pub(crate) fn succeed(&mut self, outcome: JobOutcome, message: String) {
        self.state = JobState::Success;
        self.progress_percent = 100;
        self.status_message = message;
        self.result = Some(outcome);
        self.finished_at = Some(Utc::now());
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.state = JobState::Failure;
        self.status_message = "Job failed".to_string();
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
    }
}

/// Rejected job submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("job queue is full")]
    QueueFull,

    #[error("job runner is shut down")]
    ShuttingDown,
}
