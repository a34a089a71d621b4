//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented by concrete repositories in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence`
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Repositories
//!
//! - [`ItemRepository`] - Ingested item storage and lookups
//! - [`AnalyticsRepository`] - Keyword and domain counters
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod analytics_repository;
pub mod item_repository;
pub mod storage_error;

pub use analytics_repository::AnalyticsRepository;
pub use item_repository::ItemRepository;
pub use storage_error::StorageError;

#[cfg(test)]
pub use analytics_repository::MockAnalyticsRepository;
#[cfg(test)]
pub use item_repository::MockItemRepository;
