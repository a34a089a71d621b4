//! Typed consumption loop over an [`EventChannel`] subscription.

use super::channel::{EventChannel, EventResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receives decoded events from a subscription.
///
/// Handlers own their error handling; nothing they do is reported back
/// to the publisher.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle(&self, event: E);
}

/// Subscribes to `topic` and spawns a dedicated loop feeding `handler`.
///
/// Messages are decoded as JSON into `E` and handled one at a time in
/// receipt order. Undecodable messages are dropped with a warning. The loop
/// checks `stop` between messages and exits when it fires or when the
/// subscription closes.
///
/// # Errors
///
/// Returns the channel's error if the subscription cannot be opened.
pub async fn spawn_subscriber<E, H>(
    channel: &dyn EventChannel,
    topic: &str,
    handler: Arc<H>,
    stop: CancellationToken,
) -> EventResult<JoinHandle<()>>
where
    E: DeserializeOwned + Send + 'static,
    H: EventHandler<E> + ?Sized + 'static,
{
    let rx = channel.subscribe(topic).await?;
    let topic = topic.to_string();

    Ok(tokio::spawn(consume(rx, topic, handler, stop)))
}

async fn consume<E, H>(
    mut rx: mpsc::Receiver<String>,
    topic: String,
    handler: Arc<H>,
    stop: CancellationToken,
) where
    E: DeserializeOwned + Send + 'static,
    H: EventHandler<E> + ?Sized + 'static,
{
    info!(topic, "Event subscriber started");

    loop {
        let payload = tokio::select! {
            biased;
            _ = stop.cancelled() => {
                debug!(topic, "Stop signal received");
                break;
            }
            payload = rx.recv() => payload,
        };

        let Some(payload) = payload else {
            debug!(topic, "Subscription closed");
            break;
        };

        match serde_json::from_str::<E>(&payload) {
            Ok(event) => handler.handle(event).await,
            Err(e) => {
                warn!(topic, "Dropping undecodable message: {}", e);
                metrics::counter!("events_dropped_total").increment(1);
            }
        }
    }

    info!(topic, "Event subscriber stopped");
}
