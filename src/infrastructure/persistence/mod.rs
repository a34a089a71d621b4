//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgItemRepository`] - Item storage, lookup and listing
//! - [`PgAnalyticsRepository`] - Keyword and domain counters

pub mod pg_analytics_repository;
pub mod pg_item_repository;

pub use pg_analytics_repository::PgAnalyticsRepository;
pub use pg_item_repository::PgItemRepository;
