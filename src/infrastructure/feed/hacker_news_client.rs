//! HTTP/JSON client for the Hacker News Firebase API.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use crate::domain::feed::{FeedItem, FeedSource, FetchError};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Feed client backed by `reqwest`.
///
/// Every request carries the configured timeout. Transport failures and
/// 5xx/429 responses are retried with jittered exponential backoff; an absent
/// item or an undecodable body fails immediately.
pub struct HackerNewsClient {
    client: reqwest::Client,
    base_url: String,
    retries: usize,
}

impl HackerNewsClient {
    /// Creates a client rooted at `base_url` (e.g. `https://hacker-news.firebaseio.com/v0`).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, retries: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retries,
        })
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(MAX_RETRY_DELAY)
            .map(jitter)
            .take(self.retries)
    }

    /// GETs `resource` below the base URL and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T, FetchError> {
        RetryIf::spawn(
            self.retry_strategy(),
            || self.get_json_once(resource),
            |e: &FetchError| {
                let retry = is_retryable(e);
                if retry {
                    warn!(resource, "Feed request failed, retrying: {}", e);
                }
                retry
            },
        )
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(&self, resource: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, resource);
        debug!(url, "GET feed resource");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                resource: resource.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed {
            resource: resource.to_string(),
            reason: e.to_string(),
        })
    }
}

fn is_retryable(error: &FetchError) -> bool {
    match error {
        FetchError::Transport(_) => true,
        FetchError::Status { status, .. } => *status >= 500 || *status == 429,
        FetchError::Missing(_) | FetchError::Malformed { .. } => false,
    }
}

#[async_trait]
impl FeedSource for HackerNewsClient {
    async fn list_top_ids(&self, limit: usize) -> Result<Vec<i64>, FetchError> {
        let mut ids: Vec<i64> = self.get_json("topstories.json").await?;
        ids.truncate(limit);
        Ok(ids)
    }

    async fn fetch_item(&self, id: i64) -> Result<FeedItem, FetchError> {
        let resource = format!("item/{id}.json");

        // The API answers `null` for ids it does not know.
        let item: Option<FeedItem> = self.get_json(&resource).await?;
        item.ok_or(FetchError::Missing(id))
    }
}
