//! Inventory read and mutation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{OriginalUri, Path, State};
use axum::http::HeaderMap;
use common::StoreId;
use domain::{Caller, InventoryView};
use serde::Deserialize;

use crate::AppState;
use crate::error::{ApiError, ApiErrorKind};

/// Header carrying the username established by the upstream authentication
/// layer.
pub const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user";

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub available_qty: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustQuantityRequest {
    pub adjustment: i64,
}

// -- Handlers --

/// GET /api/inventory/{sku}/stores: quantities in every store (admin only).
#[tracing::instrument(skip(state, headers, uri))]
pub async fn list_across_stores(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path(sku): Path<String>,
) -> Result<Json<Vec<InventoryView>>, ApiError> {
    let views = state
        .inventory
        .get_quantity_across_stores(&sku, &caller(&headers))
        .await
        .map_err(|e| ApiError::inventory(e, uri.path()))?;

    Ok(Json(views))
}

/// GET /api/inventory/{sku}/stores/{storeId}: quantity in one store.
#[tracing::instrument(skip(state, headers, uri))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path((sku, store_id)): Path<(String, String)>,
) -> Result<Json<InventoryView>, ApiError> {
    let store_id = parse_store_id(&store_id, uri.path())?;

    let view = state
        .inventory
        .get_quantity(&sku, store_id, &caller(&headers))
        .await
        .map_err(|e| ApiError::inventory(e, uri.path()))?;

    Ok(Json(view))
}

/// PUT /api/inventory/{sku}/stores/{storeId}: set the absolute quantity.
#[tracing::instrument(skip(state, headers, uri, body))]
pub async fn set(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path((sku, store_id)): Path<(String, String)>,
    body: Result<Json<SetQuantityRequest>, JsonRejection>,
) -> Result<Json<InventoryView>, ApiError> {
    let store_id = parse_store_id(&store_id, uri.path())?;
    let Json(req) = body.map_err(|e| invalid_body(e, uri.path()))?;

    let view = state
        .inventory
        .set_quantity(&sku, store_id, req.available_qty, &caller(&headers))
        .await
        .map_err(|e| ApiError::inventory(e, uri.path()))?;

    Ok(Json(view))
}

/// POST /api/inventory/{sku}/stores/{storeId}/adjustments: apply a delta.
#[tracing::instrument(skip(state, headers, uri, body))]
pub async fn adjust(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Path((sku, store_id)): Path<(String, String)>,
    body: Result<Json<AdjustQuantityRequest>, JsonRejection>,
) -> Result<Json<InventoryView>, ApiError> {
    let store_id = parse_store_id(&store_id, uri.path())?;
    let Json(req) = body.map_err(|e| invalid_body(e, uri.path()))?;

    let view = state
        .inventory
        .adjust_quantity(&sku, store_id, req.adjustment, &caller(&headers))
        .await
        .map_err(|e| ApiError::inventory(e, uri.path()))?;

    Ok(Json(view))
}

// -- Helpers --

fn caller(headers: &HeaderMap) -> Caller {
    Caller::from_identity(
        headers
            .get(AUTHENTICATED_USER_HEADER)
            .and_then(|value| value.to_str().ok()),
    )
}

fn parse_store_id(raw: &str, path: &str) -> Result<StoreId, ApiError> {
    raw.parse::<i64>()
        .map(StoreId::new)
        .map_err(|_| ApiError::new(ApiErrorKind::InvalidStoreId(raw.to_string()), path))
}

fn invalid_body(rejection: JsonRejection, path: &str) -> ApiError {
    ApiError::new(ApiErrorKind::Validation(rejection.body_text()), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn caller_comes_from_authenticated_user_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller(&headers), Caller::Anonymous);

        headers.insert(AUTHENTICATED_USER_HEADER, HeaderValue::from_static("clerk"));
        assert_eq!(caller(&headers), Caller::user("clerk"));
    }

    #[test]
    fn store_id_must_be_an_integer() {
        assert_eq!(parse_store_id("12", "/p").unwrap(), StoreId::new(12));

        let err = parse_store_id("twelve", "/p").unwrap_err();
        assert_eq!(err.code(), domain::ErrorCode::InvalidStoreId);
        assert_eq!(err.path, "/p");
    }

    #[test]
    fn request_bodies_are_camel_case() {
        let req: SetQuantityRequest = serde_json::from_str(r#"{"availableQty": 4}"#).unwrap();
        assert_eq!(req.available_qty, 4);

        let req: AdjustQuantityRequest = serde_json::from_str(r#"{"adjustment": -2}"#).unwrap();
        assert_eq!(req.adjustment, -2);
    }
}
