//! Feed collaborator contract and raw item normalization.
//!
//! The feed is treated as unreliable: ids may point at deleted entries,
//! non-story kinds or payloads with missing fields.

use crate::domain::entities::NewItem;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The only item kind that is ingested.
pub const STORY_KIND: &str = "story";

/// Raw item as returned by the feed's item endpoint.
///
/// Only the fields the pipeline uses are declared; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedItem {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub score: Option<i64>,
    /// Total comment count.
    #[serde(default)]
    pub descendants: Option<i64>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub dead: bool,
}

impl FeedItem {
    /// Returns true if the feed marks this entry as a story.
    pub fn is_story(&self) -> bool {
        self.kind.as_deref() == Some(STORY_KIND)
    }

    /// Normalizes the raw payload into the persisted item shape.
    ///
    /// Missing `score`/`descendants` default to 0 and negative values are
    /// clamped to 0. A blank `url` becomes absent.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the entry is not a live story or a
    /// required field (`id`, `title`, `time`) is missing or invalid.
    pub fn normalize(self) -> Result<NewItem, ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidId(self.id));
        }

        if !self.is_story() {
            return Err(ValidationError::NotAStory {
                id: self.id,
                kind: self.kind.unwrap_or_else(|| "<missing>".to_string()),
            });
        }

        if self.deleted || self.dead {
            return Err(ValidationError::Removed(self.id));
        }

        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingTitle(self.id))?;

        let seconds = self.time.ok_or(ValidationError::MissingTimestamp(self.id))?;
        let published_at = DateTime::<Utc>::from_timestamp(seconds, 0)
            .ok_or(ValidationError::InvalidTimestamp { id: self.id, seconds })?;

        Ok(NewItem {
            id: self.id,
            title,
            link: self
                .url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            published_at,
            score: self.score.unwrap_or(0).max(0),
            comment_count: self.descendants.unwrap_or(0).max(0),
            author: self.by.filter(|a| !a.is_empty()),
        })
    }
}

/// A raw item that cannot be turned into a persisted item.
///
/// The item is dropped, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("item id {0} is not a positive integer")]
    InvalidId(i64),

    #[error("item {id} is a {kind}, not a story")]
    NotAStory { id: i64, kind: String },

    #[error("item {0} is deleted or dead")]
    Removed(i64),

    #[error("item {0} has no title")]
    MissingTitle(i64),

    #[error("item {0} has no timestamp")]
    MissingTimestamp(i64),

    #[error("item {id} has an out-of-range timestamp {seconds}")]
    InvalidTimestamp { id: i64, seconds: i64 },
}

/// A failed call to the feed collaborator.
///
/// Retryable at single-id granularity; never fatal to a batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed returned HTTP {status} for {resource}")]
    Status { resource: String, status: u16 },

    #[error("feed has no item {0}")]
    Missing(i64),

    #[error("feed returned a malformed payload for {resource}: {reason}")]
    Malformed { resource: String, reason: String },
}

/// Read-only access to the external top-items feed.
///
/// # Implementations
///
/// - [`crate::infrastructure::feed::HackerNewsClient`] - HTTP/JSON client
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns at most `limit` candidate ids in feed order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the listing cannot be retrieved.
    async fn list_top_ids(&self, limit: usize) -> Result<Vec<i64>, FetchError>;

    /// Retrieves one item's detail.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure, timeout, a non-success
    /// status, an absent item or an undecodable payload.
    async fn fetch_item(&self, id: i64) -> Result<FeedItem, FetchError>;
}
