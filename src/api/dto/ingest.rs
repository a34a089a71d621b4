//! DTOs for synchronous batch ingestion.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::config::MAX_TOP_LIMIT;

/// `POST /api/ingest` query parameters.
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
pub struct IngestQuery {
    /// Number of top ids to consider; the configured default when absent.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = MAX_TOP_LIMIT))]
    pub limit: Option<usize>,
}
