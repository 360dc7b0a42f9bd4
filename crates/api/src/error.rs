//! API error types with HTTP response mapping.

use std::error::Error as _;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use domain::{ErrorCode, InventoryError};
use serde::Serialize;

/// What went wrong while handling a request.
#[derive(Debug)]
pub enum ApiErrorKind {
    /// Error raised by the inventory service.
    Inventory(InventoryError),
    /// Malformed request body.
    Validation(String),
    /// Store id path segment that is not an integer.
    InvalidStoreId(String),
}

/// API-level error carrying the request path for the error body.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub path: String,
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_code: &'static str,
    pub message: &'static str,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub path: String,
}

impl ApiError {
    /// Creates an error for the request at `path`.
    pub fn new(kind: ApiErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Wraps a service error.
    pub fn inventory(err: InventoryError, path: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Inventory(err), path)
    }

    /// Returns the stable code of this error.
    pub fn code(&self) -> ErrorCode {
        match &self.kind {
            ApiErrorKind::Inventory(err) => err.code(),
            ApiErrorKind::Validation(_) => ErrorCode::ValidationError,
            ApiErrorKind::InvalidStoreId(_) => ErrorCode::InvalidStoreId,
        }
    }

    fn details(&self) -> String {
        match &self.kind {
            ApiErrorKind::Inventory(err) => err.details(),
            ApiErrorKind::Validation(msg) => msg.clone(),
            ApiErrorKind::InvalidStoreId(raw) => format!("Invalid store id: {raw}"),
        }
    }
}

/// Maps an error code to its HTTP status.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ProductNotFound | ErrorCode::StoreNotFound | ErrorCode::InventoryNotFound => {
            StatusCode::NOT_FOUND
        }
        ErrorCode::InsufficientStock | ErrorCode::OperationFailed => StatusCode::CONFLICT,
        ErrorCode::NegativeQuantityNotAllowed
        | ErrorCode::InvalidAdjustment
        | ErrorCode::ValidationError
        | ErrorCode::InvalidRequest
        | ErrorCode::InvalidSku
        | ErrorCode::InvalidStoreId => StatusCode::BAD_REQUEST,
        ErrorCode::NotAuthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::UserNotFound
        | ErrorCode::UserInactive
        | ErrorCode::AdminRequired
        | ErrorCode::StoreAccessDenied => StatusCode::FORBIDDEN,
        ErrorCode::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = status_for(code);

        if let ApiErrorKind::Inventory(err) = &self.kind
            && let Some(source) = err.source()
        {
            tracing::error!(
                error_code = code.as_str(),
                path = %self.path,
                error = %err,
                source = %source,
                "inventory request failed"
            );
        } else {
            tracing::debug!(error_code = code.as_str(), path = %self.path, "request rejected");
        }
        metrics::counter!("api_errors_total", "code" => code.as_str()).increment(1);

        let body = ErrorBody {
            error_code: code.as_str(),
            message: code.message(),
            details: self.details(),
            timestamp: Utc::now(),
            path: self.path,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::AccessDenied;

    #[test]
    fn statuses_follow_the_code_table() {
        assert_eq!(status_for(ErrorCode::InventoryNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::InsufficientStock), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::OperationFailed), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::InvalidStoreId), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::NotAuthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorCode::StoreAccessDenied), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(ErrorCode::StorageUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn access_denial_maps_through_inventory_error() {
        let err = ApiError::inventory(
            InventoryError::from(AccessDenied::AdminRequired),
            "/api/inventory/SKU-1/stores",
        );

        assert_eq!(err.code(), ErrorCode::AdminRequired);
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn invalid_store_id_reports_raw_segment() {
        let err = ApiError::new(ApiErrorKind::InvalidStoreId("abc".to_string()), "/x");

        assert_eq!(err.details(), "Invalid store id: abc");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
