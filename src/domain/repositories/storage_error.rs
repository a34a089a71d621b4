//! Persistence failure type shared by all repositories.

/// A failure in the underlying store.
///
/// Callers treat it as retryable for the affected item only.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
