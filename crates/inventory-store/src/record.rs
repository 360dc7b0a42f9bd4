use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{InventoryId, ProductId, StoreId, Version};

/// Stock level of one product in one store.
///
/// Records are keyed by `(product_id, store_id)`. The `version` is the
/// optimistic-concurrency token: a conditional save only commits when the
/// stored version still equals the version carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Surrogate id, `None` until the record is first saved.
    pub id: Option<InventoryId>,
    pub product_id: ProductId,
    pub store_id: StoreId,
    /// Units available for sale. Never negative once stored.
    pub available_qty: i64,
    pub version: Version,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Creates an unsaved record at version 0 with no stock.
    pub fn new(product_id: ProductId, store_id: StoreId) -> Self {
        Self {
            id: None,
            product_id,
            store_id,
            available_qty: 0,
            version: Version::initial(),
            updated_at: Utc::now(),
        }
    }

    /// Returns true if the record has never been saved.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Returns the record with `available_qty` replaced.
    pub fn with_quantity(mut self, available_qty: i64) -> Self {
        self.available_qty = available_qty;
        self
    }

    /// Returns the composite key of the record.
    pub fn key(&self) -> (ProductId, StoreId) {
        (self.product_id, self.store_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_unsaved_and_empty() {
        let record = InventoryRecord::new(ProductId::new(1), StoreId::new(2));

        assert!(record.is_new());
        assert_eq!(record.available_qty, 0);
        assert_eq!(record.version, Version::initial());
        assert_eq!(record.key(), (ProductId::new(1), StoreId::new(2)));
    }

    #[test]
    fn with_quantity_keeps_version() {
        let record = InventoryRecord::new(ProductId::new(1), StoreId::new(2)).with_quantity(15);

        assert_eq!(record.available_qty, 15);
        assert_eq!(record.version, Version::initial());
    }
}
