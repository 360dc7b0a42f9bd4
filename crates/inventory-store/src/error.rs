use thiserror::Error;

use crate::{ProductId, StoreId, Version};

/// Errors that can occur when interacting with inventory storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write lost the race: the stored version no longer
    /// matches the version the record was loaded at, or a record for the key
    /// was created concurrently.
    #[error(
        "Version conflict for product {product_id} in store {store_id}: expected version {expected}"
    )]
    VersionConflict {
        product_id: ProductId,
        store_id: StoreId,
        expected: Version,
    },

    /// A stored row could not be mapped to a domain value.
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if this is a lost optimistic-concurrency race.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
