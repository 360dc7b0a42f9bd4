//! Caller-facing inventory view.

use chrono::{DateTime, Utc};
use common::{InventoryId, StoreId};
use inventory_store::{InventoryRecord, Product, Store};
use serde::{Deserialize, Serialize};

/// An inventory record joined with product and store display attributes.
///
/// Display fields are `None` when the catalog entry is missing; quantity and
/// version always come from the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    pub id: Option<InventoryId>,
    pub product_sku: Option<String>,
    pub product_name: Option<String>,
    pub store_id: StoreId,
    pub store_name: Option<String>,
    pub available_qty: i64,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

/// Builds the view for `record`.
pub fn enrich(
    record: &InventoryRecord,
    product: Option<&Product>,
    store: Option<&Store>,
) -> InventoryView {
    if product.is_none() || store.is_none() {
        tracing::warn!(
            product_id = %record.product_id,
            store_id = %record.store_id,
            "inventory record references missing catalog entries"
        );
    }

    InventoryView {
        id: record.id,
        product_sku: product.map(|p| p.sku.clone()),
        product_name: product.map(|p| p.name.clone()),
        store_id: record.store_id,
        store_name: store.map(|s| s.name.clone()),
        available_qty: record.available_qty,
        version: record.version.as_i64(),
        updated_at: record.updated_at,
    }
}
