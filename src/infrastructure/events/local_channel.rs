//! In-process event channel.

use super::channel::{EventChannel, EventError, EventResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Event channel backed by one `tokio::sync::broadcast` per topic.
///
/// Used when Redis is not configured or unreachable at startup. Only
/// subscribers inside this process receive messages.
pub struct LocalEventChannel {
    topics: RwLock<HashMap<String, broadcast::Sender<String>>>,
    capacity: usize,
    forwarders: TaskTracker,
    stop: CancellationToken,
}

impl LocalEventChannel {
    /// Creates a channel buffering up to `capacity` messages per topic.
    pub fn new(capacity: usize) -> Self {
        debug!("Using in-process event channel");
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            forwarders: TaskTracker::new(),
            stop: CancellationToken::new(),
        }
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<String> {
        if let Some(tx) = self
            .topics
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(topic)
        {
            return tx.clone();
        }

        self.topics
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for LocalEventChannel {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventChannel for LocalEventChannel {
    fn publish(&self, topic: &str, payload: String) {
        if self.stop.is_cancelled() {
            warn!(topic, "Event channel shut down, dropping message");
            metrics::counter!("events_dropped_total").increment(1);
            return;
        }

        let topics = self.topics.read().unwrap_or_else(|e| e.into_inner());
        match topics.get(topic) {
            Some(tx) if tx.send(payload).is_ok() => {
                metrics::counter!("events_published_total").increment(1);
            }
            _ => debug!(topic, "No subscribers, message dropped"),
        }
    }

    async fn subscribe(&self, topic: &str) -> EventResult<mpsc::Receiver<String>> {
        if self.stop.is_cancelled() {
            return Err(EventError::Closed);
        }

        let mut source = self.sender(topic).subscribe();
        let (tx, rx) = mpsc::channel(self.capacity);
        let stop = self.stop.clone();
        let topic = topic.to_string();

        self.forwarders.spawn(async move {
            loop {
                let message = tokio::select! {
                    _ = stop.cancelled() => break,
                    message = source.recv() => message,
                };

                match message {
                    Ok(payload) => {
                        if tx.send(payload).await.is_err() {
                            debug!(topic, "Subscriber dropped its receiver");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(topic, skipped, "Subscriber lagged, messages dropped");
                        metrics::counter!("events_dropped_total").increment(skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }

    async fn shutdown(&self) {
        self.stop.cancel();
        self.forwarders.close();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.forwarders.wait())
            .await
            .is_err()
        {
            warn!("Event forwarders did not stop within {:?}", SHUTDOWN_GRACE);
        }
        self.topics
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    async fn health_check(&self) -> bool {
        !self.stop.is_cancelled()
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
