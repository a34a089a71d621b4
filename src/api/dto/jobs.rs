//! DTOs for job submission and status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::application::jobs::{JobSpec, JobState, JobStatus};
use crate::config::MAX_TOP_LIMIT;

/// Job kinds accepted by `POST /api/jobs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    FetchTopItems,
    RefreshSummary,
}

/// `POST /api/jobs` request body.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitJobRequest {
    pub kind: JobKind,

    /// Batch size for `fetch_top_items`; ignored by other kinds.
    #[serde(default)]
    #[validate(range(min = 1, max = MAX_TOP_LIMIT))]
    pub limit: Option<usize>,
}

impl SubmitJobRequest {
    pub fn into_spec(self) -> JobSpec {
        match self.kind {
            JobKind::FetchTopItems => JobSpec::FetchTopItems { limit: self.limit },
            JobKind::RefreshSummary => JobSpec::RefreshSummary,
        }
    }
}

/// `202 Accepted` body for a submitted job.
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: Uuid,
    pub state: JobState,
}

impl From<JobStatus> for SubmitJobResponse {
    fn from(status: JobStatus) -> Self {
        Self {
            job_id: status.job_id,
            state: status.state,
        }
    }
}
