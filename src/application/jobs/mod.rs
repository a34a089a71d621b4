//! Job runner for batch ingestion and summary refresh.
//!
//! Jobs are submitted from the request path and executed by a bounded
//! worker pool. Callers poll [`JobRunner::status`] by id.

mod model;
mod runner;

pub use model::{JobError, JobOutcome, JobSpec, JobState, JobStatus};
pub use runner::{JobContext, JobRunner, JobRunnerSettings};
