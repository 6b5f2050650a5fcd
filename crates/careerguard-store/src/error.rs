//! Error types for the TTL stores.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by [`LocalCache`](crate::LocalCache) and
/// [`TemporaryFileStorage`](crate::TemporaryFileStorage).
///
/// `NotFound` and `Expired` are ordinary misses; callers usually treat
/// both as "regenerate". The rest are environment failures and are never
/// retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The path is not tracked by this storage.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The path was tracked but its TTL has passed. The file has been deleted.
    #[error("File expired: {}", .0.display())]
    Expired(PathBuf),

    /// Filesystem read or write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded key/value store failed.
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    /// A value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
