//! HTTP API server with observability for the store inventory service.
//!
//! Provides REST endpoints for reading and mutating per-store stock levels,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{InventoryService, RetryPolicy};
use inventory_store::{
    InMemoryCatalog, InMemoryInventoryRepository, InMemoryUserDirectory, InventoryRecord,
    InventoryRepository, PostgresCatalog, PostgresInventoryRepository, Product, ProductCatalog,
    ProductId, Role, Store, StoreDirectory, StoreError, StoreId, User, UserDirectory, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Inventory service over type-erased storage backends.
pub type SharedInventoryService = InventoryService<
    Arc<dyn InventoryRepository>,
    Arc<dyn ProductCatalog>,
    Arc<dyn StoreDirectory>,
    Arc<dyn UserDirectory>,
>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub inventory: SharedInventoryService,
}

impl AppState {
    /// Builds the state from storage backends and a retry policy.
    pub fn new(
        repository: Arc<dyn InventoryRepository>,
        products: Arc<dyn ProductCatalog>,
        stores: Arc<dyn StoreDirectory>,
        users: Arc<dyn UserDirectory>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inventory: InventoryService::new(repository, products, stores, users)
                .with_retry_policy(retry),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/inventory/{sku}/stores",
            get(routes::inventory::list_across_stores),
        )
        .route(
            "/api/inventory/{sku}/stores/{store_id}",
            get(routes::inventory::get).put(routes::inventory::set),
        )
        .route(
            "/api/inventory/{sku}/stores/{store_id}/adjustments",
            post(routes::inventory::adjust),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over PostgreSQL, running migrations first.
pub async fn create_postgres_state(
    pool: PgPool,
    retry: RetryPolicy,
) -> Result<Arc<AppState>, StoreError> {
    let repository = PostgresInventoryRepository::new(pool.clone());
    repository.run_migrations().await?;
    let catalog = Arc::new(PostgresCatalog::new(pool));

    Ok(Arc::new(AppState::new(
        Arc::new(repository),
        catalog.clone(),
        catalog.clone(),
        catalog,
        retry,
    )))
}

/// Creates in-memory application state seeded with demo data:
///
/// - products `SKU-001` (Wireless Mouse) and `SKU-002` (Mechanical Keyboard)
/// - stores 1 (Downtown) and 2 (Airport)
/// - users `admin` (ADMIN), `downtown_clerk` (store 1) and `airport_clerk` (store 2)
/// - `SKU-001` stocked at 50 in store 1 and 20 in store 2
pub async fn create_in_memory_state(retry: RetryPolicy) -> Result<Arc<AppState>, StoreError> {
    let catalog = InMemoryCatalog::new();
    catalog
        .insert_product(Product::new(ProductId::new(1), "SKU-001", "Wireless Mouse"))
        .await;
    catalog
        .insert_product(Product::new(
            ProductId::new(2),
            "SKU-002",
            "Mechanical Keyboard",
        ))
        .await;
    catalog
        .insert_store(Store::new(StoreId::new(1), "Downtown"))
        .await;
    catalog
        .insert_store(Store::new(StoreId::new(2), "Airport"))
        .await;

    let users = InMemoryUserDirectory::new();
    users
        .insert_user(User::new(UserId::new(1), "admin", Role::Admin))
        .await;
    users
        .insert_user(User::new(UserId::new(2), "downtown_clerk", Role::StoreUser))
        .await;
    users
        .insert_user(User::new(UserId::new(3), "airport_clerk", Role::StoreUser))
        .await;
    users.grant("downtown_clerk", StoreId::new(1)).await;
    users.grant("airport_clerk", StoreId::new(2)).await;

    let repository = InMemoryInventoryRepository::new();
    for (store, qty) in [(1, 50), (2, 20)] {
        repository
            .conditional_save(
                InventoryRecord::new(ProductId::new(1), StoreId::new(store)).with_quantity(qty),
            )
            .await?;
    }

    let catalog = Arc::new(catalog);
    Ok(Arc::new(AppState::new(
        Arc::new(repository),
        catalog.clone(),
        catalog,
        Arc::new(users),
        retry,
    )))
}
