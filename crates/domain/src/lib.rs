//! Domain layer for the store inventory service.
//!
//! This crate provides:
//! - the authorization gate deciding who may touch a store's inventory
//! - the bounded retry policy for lost version races
//! - the enrichment of raw records into caller-facing views
//! - `InventoryService`, the optimistic-concurrency mutation engine

pub mod auth;
pub mod error;
pub mod projection;
pub mod retry;
pub mod service;

pub use auth::{AccessDenied, AccessGate, AccessRequirement, Caller, evaluate};
pub use error::{ErrorCode, InventoryError};
pub use projection::{InventoryView, enrich};
pub use retry::RetryPolicy;
pub use service::InventoryService;
