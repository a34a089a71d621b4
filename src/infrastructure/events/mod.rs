//! Event distribution for "item stored" notifications.
//!
//! Provides an [`EventChannel`] trait with two implementations:
//! - [`RedisEventChannel`] - Cross-process Redis pub/sub
//! - [`LocalEventChannel`] - In-process fallback when Redis is unavailable
//!
//! [`spawn_subscriber`] runs a typed consumption loop on top of either.

mod channel;
mod local_channel;
mod redis_channel;
mod subscriber;

pub use channel::{EventChannel, EventError, EventResult};
pub use local_channel::LocalEventChannel;
pub use redis_channel::RedisEventChannel;
pub use subscriber::{EventHandler, spawn_subscriber};

#[cfg(test)]
pub use channel::MockEventChannel;
