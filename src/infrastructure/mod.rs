//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for persistence, the upstream feed and the
//! internal event channel.
//!
//! # Modules
//!
//! - [`events`] - Publish/subscribe channel (in-process and Redis)
//! - [`feed`] - Top-items feed HTTP client
//! - [`persistence`] - PostgreSQL repository implementations

pub mod events;
pub mod feed;
pub mod persistence;
