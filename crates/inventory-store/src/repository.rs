use std::sync::Arc;

use async_trait::async_trait;

use crate::{InventoryRecord, ProductId, Result, StoreId};

/// Conditional-write storage contract for inventory records.
///
/// All implementations must be thread-safe (Send + Sync). The only
/// serialization point between concurrent writers is [`conditional_save`],
/// which must behave as an atomic compare-and-swap on `(key, version)`.
///
/// [`conditional_save`]: InventoryRepository::conditional_save
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// Loads the record for a product in a store.
    ///
    /// Returns None if no record exists yet.
    async fn load(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<InventoryRecord>>;

    /// Saves the record if nobody else has written it since it was loaded.
    ///
    /// For an unsaved record (`id == None`) the save inserts, and fails if a
    /// record for the same key already exists. For a saved record the stored
    /// version must equal `record.version`.
    ///
    /// On success returns the stored record with version + 1, a fresh
    /// `updated_at` and its id. On a lost race fails with
    /// `StoreError::VersionConflict`.
    async fn conditional_save(&self, record: InventoryRecord) -> Result<InventoryRecord>;

    /// Retrieves all records for a product, ordered by store id.
    async fn find_by_product(&self, product_id: ProductId) -> Result<Vec<InventoryRecord>>;
}

#[async_trait]
impl<T: InventoryRepository + ?Sized> InventoryRepository for Arc<T> {
    async fn load(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<InventoryRecord>> {
        (**self).load(product_id, store_id).await
    }

    async fn conditional_save(&self, record: InventoryRecord) -> Result<InventoryRecord> {
        (**self).conditional_save(record).await
    }

    async fn find_by_product(&self, product_id: ProductId) -> Result<Vec<InventoryRecord>> {
        (**self).find_by_product(product_id).await
    }
}
