//! Core domain entities.
//!
//! Entities are plain data structures without persistence logic.
//!
//! # Entity Types
//!
//! - [`Item`] - A news entry ingested from the feed
//! - [`KeywordCount`] - Per-keyword match counter
//! - [`DomainCount`] - Per-host link counter
//!
//! Creation inputs use a separate `NewItem` struct; `fetched_at` is owned
//! by the store.

pub mod analytics;
pub mod item;

pub use analytics::{AnalyticsSummary, DomainCount, KeywordCount};
pub use item::{Item, ItemFilter, NewItem};
