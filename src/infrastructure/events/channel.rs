//! Event channel trait and error types.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Errors that can occur while setting up an event channel.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event channel connection error: {0}")]
    Connection(String),

    #[error("event channel subscribe error: {0}")]
    Subscribe(String),

    #[error("event channel is shut down")]
    Closed,
}

/// Result type for event channel operations.
pub type EventResult<T> = Result<T, EventError>;

/// Process-wide publish/subscribe bus for raw text messages.
///
/// Delivery is at most once per connected subscriber: there is no
/// persistence or replay, so a subscriber that connects after a publish
/// misses it.
///
/// # Implementations
///
/// - [`crate::infrastructure::events::RedisEventChannel`] - Redis `PUBLISH`/`SUBSCRIBE`
/// - [`crate::infrastructure::events::LocalEventChannel`] - In-process broadcast
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventChannel: Send + Sync {
    /// Publishes `payload` on `topic`.
    ///
    /// Fire-and-forget: never waits for subscribers and never reports
    /// delivery failures to the caller. Failures are logged.
    fn publish(&self, topic: &str, payload: String);

    /// Opens a subscription to `topic`.
    ///
    /// Messages are yielded in receipt order. The receiver closes when the
    /// channel shuts down.
    ///
    /// # Errors
    ///
    /// Returns [`EventError`] if the subscription cannot be established.
    async fn subscribe(&self, topic: &str) -> EventResult<mpsc::Receiver<String>>;

    /// Stops forwarding and waits briefly for in-flight deliveries.
    ///
    /// Already-queued but undelivered messages may be lost.
    async fn shutdown(&self);

    /// Checks if the channel backend is healthy.
    async fn health_check(&self) -> bool;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
