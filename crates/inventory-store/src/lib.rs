//! Storage layer for the store inventory service.
//!
//! Provides the versioned [`InventoryRecord`], the conditional-write
//! [`InventoryRepository`] contract, the read-only catalog lookups
//! ([`ProductCatalog`], [`StoreDirectory`], [`UserDirectory`]) and two
//! backends for each: in-memory and PostgreSQL.

pub mod catalog;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod repository;
pub mod version;

pub use catalog::{
    InMemoryCatalog, InMemoryUserDirectory, Product, ProductCatalog, Role, Store,
    StoreDirectory, User, UserDirectory,
};
pub use common::{InventoryId, ProductId, StoreId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryInventoryRepository;
pub use postgres::{PostgresCatalog, PostgresInventoryRepository};
pub use record::InventoryRecord;
pub use repository::InventoryRepository;
pub use version::Version;
