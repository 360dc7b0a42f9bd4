//! Inventory error taxonomy.

use common::StoreId;
use inventory_store::StoreError;
use thiserror::Error;

use crate::auth::AccessDenied;

/// Stable machine-readable error codes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ProductNotFound,
    StoreNotFound,
    InventoryNotFound,
    InsufficientStock,
    NegativeQuantityNotAllowed,
    InvalidAdjustment,
    OperationFailed,
    ValidationError,
    InvalidRequest,
    InvalidSku,
    InvalidStoreId,
    NotAuthenticated,
    UserNotFound,
    AdminRequired,
    StoreAccessDenied,
    UserInactive,
    StorageUnavailable,
}

impl ErrorCode {
    /// Returns the wire code, e.g. `INV-004`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ProductNotFound => "INV-001",
            ErrorCode::StoreNotFound => "INV-002",
            ErrorCode::InventoryNotFound => "INV-003",
            ErrorCode::InsufficientStock => "INV-004",
            ErrorCode::NegativeQuantityNotAllowed => "INV-005",
            ErrorCode::InvalidAdjustment => "INV-009",
            ErrorCode::OperationFailed => "INV-010",
            ErrorCode::ValidationError => "VAL-001",
            ErrorCode::InvalidRequest => "VAL-002",
            ErrorCode::InvalidSku => "VAL-003",
            ErrorCode::InvalidStoreId => "VAL-004",
            ErrorCode::NotAuthenticated => "AUTH-006",
            ErrorCode::UserNotFound => "AUTH-007",
            ErrorCode::AdminRequired => "AUTH-008",
            ErrorCode::StoreAccessDenied => "AUTH-009",
            ErrorCode::UserInactive => "AUTH-010",
            ErrorCode::StorageUnavailable => "SYS-002",
        }
    }

    /// Returns the generic human-readable message for the code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::StoreNotFound => "Store not found",
            ErrorCode::InventoryNotFound => "Inventory not found",
            ErrorCode::InsufficientStock => "Insufficient stock available",
            ErrorCode::NegativeQuantityNotAllowed => "Negative quantity not allowed",
            ErrorCode::InvalidAdjustment => "Invalid inventory adjustment",
            ErrorCode::OperationFailed => "Inventory update failed. Please retry",
            ErrorCode::ValidationError => "Validation error",
            ErrorCode::InvalidRequest => "Invalid request parameters",
            ErrorCode::InvalidSku => "Product SKU must not be blank",
            ErrorCode::InvalidStoreId => "Store id must be a positive integer",
            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::AdminRequired => "Administrator role required",
            ErrorCode::StoreAccessDenied => "Access to this store is not permitted",
            ErrorCode::UserInactive => "User account is disabled",
            ErrorCode::StorageUnavailable => "Database operation failed",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the inventory operations.
///
/// Storage failures keep the underlying [`StoreError`] as their `source`, but
/// their `Display` text never includes it.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Product SKU must not be blank")]
    InvalidSku,

    #[error("Invalid store id: {0}")]
    InvalidStoreId(StoreId),

    #[error("Negative quantity not allowed: {0}")]
    NegativeQuantity(i64),

    #[error("Invalid inventory adjustment: {adjustment}")]
    InvalidAdjustment { adjustment: i64, reason: String },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Store not found: {0}")]
    StoreNotFound(StoreId),

    #[error("Inventory not found for product {sku} in store {store_id}")]
    InventoryNotFound { sku: String, store_id: StoreId },

    #[error(
        "Insufficient stock: current {current}, adjustment {adjustment}, would be {would_be}"
    )]
    InsufficientStock {
        current: i64,
        adjustment: i64,
        would_be: i64,
    },

    #[error(transparent)]
    Access(#[from] AccessDenied),

    #[error("Inventory storage is unavailable")]
    StorageUnavailable(#[source] StoreError),

    #[error("Inventory update failed: {reason}")]
    OperationFailed {
        reason: String,
        #[source]
        source: Option<StoreError>,
    },
}

impl InventoryError {
    /// Returns the stable code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            InventoryError::InvalidSku => ErrorCode::InvalidSku,
            InventoryError::InvalidStoreId(_) => ErrorCode::InvalidStoreId,
            InventoryError::NegativeQuantity(_) => ErrorCode::NegativeQuantityNotAllowed,
            InventoryError::InvalidAdjustment { .. } => ErrorCode::InvalidAdjustment,
            InventoryError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            InventoryError::StoreNotFound(_) => ErrorCode::StoreNotFound,
            InventoryError::InventoryNotFound { .. } => ErrorCode::InventoryNotFound,
            InventoryError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            InventoryError::Access(denied) => denied.code(),
            InventoryError::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
            InventoryError::OperationFailed { .. } => ErrorCode::OperationFailed,
        }
    }

    /// Returns caller-facing diagnostic details.
    pub fn details(&self) -> String {
        match self {
            InventoryError::InvalidAdjustment { reason, .. } => reason.clone(),
            InventoryError::StorageUnavailable(_) => {
                "The inventory store could not be reached".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Returns true for the exhausted-retry and write-failure case.
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, InventoryError::OperationFailed { .. })
    }

    pub(crate) fn operation_failed(reason: impl Into<String>, source: Option<StoreError>) -> Self {
        InventoryError::OperationFailed {
            reason: reason.into(),
            source,
        }
    }
}
