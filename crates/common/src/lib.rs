//! Shared types for the store inventory service.

pub mod types;

pub use types::{InventoryId, ProductId, StoreId, UserId};
