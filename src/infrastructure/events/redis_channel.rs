//! Redis-backed event channel.

use super::channel::{EventChannel, EventError, EventResult};
use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::{ConnectionManager, PubSub};
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const MAX_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Count of subscriptions currently without a live pub/sub connection.
#[derive(Debug, Default)]
struct SubscriptionHealth {
    lost: AtomicUsize,
}

impl SubscriptionHealth {
    fn mark_lost(&self) {
        self.lost.fetch_add(1, Ordering::SeqCst);
    }

    fn mark_restored(&self) {
        let _ = self
            .lost
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn is_healthy(&self) -> bool {
        self.lost.load(Ordering::SeqCst) == 0
    }
}

/// Why a forwarding loop returned.
#[derive(Debug, PartialEq, Eq)]
enum StreamEnd {
    Stopped,
    ReceiverDropped,
    Lost,
}

async fn open_subscription(client: &Client, topic: &str) -> EventResult<PubSub> {
    let mut pubsub = client
        .get_async_pubsub()
        .await
        .map_err(|e| EventError::Subscribe(format!("Failed to open pub/sub: {}", e)))?;

    pubsub
        .subscribe(topic)
        .await
        .map_err(|e| EventError::Subscribe(format!("SUBSCRIBE {} failed: {}", topic, e)))?;

    Ok(pubsub)
}

/// Moves messages from one pub/sub connection into `tx` until something ends it.
async fn forward(
    topic: &str,
    pubsub: PubSub,
    tx: &mpsc::Sender<String>,
    stop: &CancellationToken,
) -> StreamEnd {
    let mut messages = std::pin::pin!(pubsub.into_on_message());
    loop {
        let message = tokio::select! {
            _ = stop.cancelled() => return StreamEnd::Stopped,
            message = messages.next() => message,
        };

        let Some(message) = message else {
            return StreamEnd::Lost;
        };

        match message.get_payload::<String>() {
            Ok(payload) => {
                if tx.send(payload).await.is_err() {
                    return StreamEnd::ReceiverDropped;
                }
            }
            Err(e) => {
                warn!(topic, "Dropping non-text Redis message: {}", e);
                metrics::counter!("events_dropped_total").increment(1);
            }
        }
    }
}

/// Reopens a subscription with capped exponential backoff.
///
/// Returns `None` once the channel is stopped or the subscriber is gone.
async fn resubscribe(
    client: &Client,
    topic: &str,
    tx: &mpsc::Sender<String>,
    stop: &CancellationToken,
) -> Option<PubSub> {
    let mut delays = ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(MAX_RESUBSCRIBE_DELAY)
        .map(jitter);

    loop {
        let delay = delays.next().unwrap_or(MAX_RESUBSCRIBE_DELAY);
        tokio::select! {
            biased;
            _ = stop.cancelled() => return None,
            _ = tx.closed() => return None,
            _ = tokio::time::sleep(delay) => {}
        }

        match open_subscription(client, topic).await {
            Ok(pubsub) => return Some(pubsub),
            Err(e) => warn!(topic, "Resubscribe attempt failed: {}", e),
        }
    }
}

/// Event channel over Redis `PUBLISH`/`SUBSCRIBE`.
///
/// Publishing reuses one `ConnectionManager`; every subscription opens its
/// own pub/sub connection and reopens it with backoff when Redis drops it.
/// Publishes run on tracked background tasks so the caller never waits on
/// Redis.
pub struct RedisEventChannel {
    client: Client,
    publisher: ConnectionManager,
    buffer: usize,
    subscriptions: Arc<SubscriptionHealth>,
    tasks: TaskTracker,
    stop: CancellationToken,
}

impl RedisEventChannel {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `buffer` - Per-subscriber queue length between Redis and the consumer
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Connection`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, buffer: usize) -> EventResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            EventError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let publisher = ConnectionManager::new(client.clone()).await.map_err(|e| {
            EventError::Connection(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = publisher.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| EventError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis event channel");

        Ok(Self {
            client,
            publisher,
            buffer: buffer.max(1),
            subscriptions: Arc::new(SubscriptionHealth::default()),
            tasks: TaskTracker::new(),
            stop: CancellationToken::new(),
        })
    }
}

#[async_trait]
impl EventChannel for RedisEventChannel {
    fn publish(&self, topic: &str, payload: String) {
        if self.stop.is_cancelled() {
            warn!(topic, "Event channel shut down, dropping message");
            metrics::counter!("events_dropped_total").increment(1);
            return;
        }

        let mut conn = self.publisher.clone();
        let topic = topic.to_string();

        self.tasks.spawn(async move {
            match conn.publish::<_, _, i64>(&topic, payload).await {
                Ok(receivers) => {
                    debug!(topic, receivers, "Event published");
                    metrics::counter!("events_published_total").increment(1);
                }
                Err(e) => {
                    error!(topic, "Redis PUBLISH failed: {}", e);
                    metrics::counter!("events_dropped_total").increment(1);
                }
            }
        });
    }

    async fn subscribe(&self, topic: &str) -> EventResult<mpsc::Receiver<String>> {
        if self.stop.is_cancelled() {
            return Err(EventError::Closed);
        }

        let mut pubsub = open_subscription(&self.client, topic).await?;
        info!(topic, "Subscribed to Redis topic");

        let (tx, rx) = mpsc::channel(self.buffer);
        let client = self.client.clone();
        let health = self.subscriptions.clone();
        let stop = self.stop.clone();
        let topic = topic.to_string();

        self.tasks.spawn(async move {
            loop {
                match forward(&topic, pubsub, &tx, &stop).await {
                    StreamEnd::Stopped => break,
                    StreamEnd::ReceiverDropped => {
                        debug!(topic, "Subscriber dropped its receiver");
                        break;
                    }
                    StreamEnd::Lost => {}
                }

                warn!(topic, "Redis pub/sub stream ended, resubscribing");
                metrics::counter!("event_subscriptions_lost_total").increment(1);
                health.mark_lost();

                let restored = resubscribe(&client, &topic, &tx, &stop).await;
                health.mark_restored();

                match restored {
                    Some(next) => {
                        info!(topic, "Resubscribed to Redis topic");
                        pubsub = next;
                    }
                    None => break,
                }
            }
        });

        Ok(rx)
    }

    async fn shutdown(&self) {
        self.stop.cancel();
        self.tasks.close();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.tasks.wait())
            .await
            .is_err()
        {
            warn!("Redis event tasks did not finish within {:?}", SHUTDOWN_GRACE);
        }
    }

    /// Unhealthy while any subscription is waiting to be reopened.
    async fn health_check(&self) -> bool {
        if !self.subscriptions.is_healthy() {
            return false;
        }
        let mut conn = self.publisher.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
