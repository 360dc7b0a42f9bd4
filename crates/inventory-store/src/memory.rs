use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    InventoryId, InventoryRecord, ProductId, Result, StoreError, StoreId,
    repository::InventoryRepository,
};

#[derive(Default)]
struct MemoryState {
    records: HashMap<(ProductId, StoreId), InventoryRecord>,
    next_id: i64,
}

/// In-memory inventory repository.
///
/// The version check and the write happen under one write lock, which gives
/// the same compare-and-swap semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryInventoryRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryInventoryRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Removes all records.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.records.clear();
        state.next_id = 0;
    }
}

#[async_trait]
impl InventoryRepository for InMemoryInventoryRepository {
    async fn load(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<InventoryRecord>> {
        let state = self.state.read().await;
        Ok(state.records.get(&(product_id, store_id)).cloned())
    }

    async fn conditional_save(&self, record: InventoryRecord) -> Result<InventoryRecord> {
        let mut state = self.state.write().await;
        let key = record.key();

        let conflict = StoreError::VersionConflict {
            product_id: record.product_id,
            store_id: record.store_id,
            expected: record.version,
        };

        let id = match (record.id, state.records.get(&key)) {
            (None, None) => {
                state.next_id += 1;
                InventoryId::new(state.next_id)
            }
            (Some(id), Some(stored)) if stored.version == record.version => id,
            // Inserted by someone else, or advanced past our version
            _ => return Err(conflict),
        };

        let saved = InventoryRecord {
            id: Some(id),
            version: record.version.next(),
            updated_at: Utc::now(),
            ..record
        };
        state.records.insert(key, saved.clone());

        tracing::debug!(
            inventory_id = %id,
            version = %saved.version,
            "saved inventory record"
        );
        Ok(saved)
    }

    async fn find_by_product(&self, product_id: ProductId) -> Result<Vec<InventoryRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<_> = state
            .records
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.store_id);
        Ok(records)
    }
}
