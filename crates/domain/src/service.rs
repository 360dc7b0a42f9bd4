//! Inventory service: the optimistic-concurrency mutation engine.

use std::time::Instant;

use common::{ProductId, StoreId};
use futures_util::future::try_join_all;
use inventory_store::{
    InventoryRecord, InventoryRepository, Product, ProductCatalog, Store, StoreDirectory,
    StoreError, UserDirectory,
};

use crate::auth::{AccessGate, AccessRequirement, Caller};
use crate::error::InventoryError;
use crate::projection::{InventoryView, enrich};
use crate::retry::RetryPolicy;

const OP_SET: &str = "set";
const OP_ADJUST: &str = "adjust";

/// Service for reading and mutating per-store stock levels.
///
/// Every operation authorizes the caller first, then validates its input,
/// then resolves product, store and record in that order. Writes are
/// conditional on the record version; a lost race reloads the record and
/// recomputes the new value from the fresh base, up to the configured
/// [`RetryPolicy`].
pub struct InventoryService<R, P, S, U> {
    repository: R,
    products: P,
    stores: S,
    gate: AccessGate<U>,
    retry: RetryPolicy,
}

impl<R, P, S, U> InventoryService<R, P, S, U>
where
    R: InventoryRepository,
    P: ProductCatalog,
    S: StoreDirectory,
    U: UserDirectory,
{
    /// Creates a service with the default retry policy.
    pub fn new(repository: R, products: P, stores: S, users: U) -> Self {
        Self {
            repository,
            products,
            stores,
            gate: AccessGate::new(users),
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns the active retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Sets the absolute quantity of `sku` in `store_id`, creating the record
    /// if the pair has none yet.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        sku: &str,
        store_id: StoreId,
        quantity: i64,
        caller: &Caller,
    ) -> Result<InventoryView, InventoryError> {
        let started = Instant::now();
        let result = self
            .set_quantity_inner(sku, store_id, quantity, caller)
            .await;
        record_mutation(OP_SET, started, &result);
        result
    }

    /// Adds `adjustment` (which may be negative) to the quantity of `sku` in
    /// `store_id`. Never creates a record.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_quantity(
        &self,
        sku: &str,
        store_id: StoreId,
        adjustment: i64,
        caller: &Caller,
    ) -> Result<InventoryView, InventoryError> {
        let started = Instant::now();
        let result = self
            .adjust_quantity_inner(sku, store_id, adjustment, caller)
            .await;
        record_mutation(OP_ADJUST, started, &result);
        result
    }

    /// Reads the quantity of `sku` in `store_id`.
    #[tracing::instrument(skip(self))]
    pub async fn get_quantity(
        &self,
        sku: &str,
        store_id: StoreId,
        caller: &Caller,
    ) -> Result<InventoryView, InventoryError> {
        self.gate
            .authorize(caller, AccessRequirement::Store(Some(store_id)))
            .await?;
        validate_sku(sku)?;
        validate_store_id(store_id)?;

        let (product, store) = self.resolve(sku, store_id, storage_unavailable).await?;
        let record = self
            .repository
            .load(product.id, store.id)
            .await
            .map_err(storage_unavailable)?
            .ok_or_else(|| InventoryError::InventoryNotFound {
                sku: sku.to_string(),
                store_id,
            })?;

        Ok(enrich(&record, Some(&product), Some(&store)))
    }

    /// Reads the quantity of `sku` in every store holding a record, ordered
    /// by store id. Administrators only.
    #[tracing::instrument(skip(self))]
    pub async fn get_quantity_across_stores(
        &self,
        sku: &str,
        caller: &Caller,
    ) -> Result<Vec<InventoryView>, InventoryError> {
        self.gate
            .authorize(caller, AccessRequirement::AdminOnly)
            .await?;
        validate_sku(sku)?;

        let product = self.find_product(sku, storage_unavailable).await?;
        let records = self
            .repository
            .find_by_product(product.id)
            .await
            .map_err(storage_unavailable)?;

        let stores = try_join_all(records.iter().map(|r| self.stores.find_by_id(r.store_id)))
            .await
            .map_err(storage_unavailable)?;

        Ok(records
            .iter()
            .zip(stores.iter())
            .map(|(record, store)| enrich(record, Some(&product), store.as_ref()))
            .collect())
    }

    async fn set_quantity_inner(
        &self,
        sku: &str,
        store_id: StoreId,
        quantity: i64,
        caller: &Caller,
    ) -> Result<InventoryView, InventoryError> {
        self.gate
            .authorize(caller, AccessRequirement::Store(Some(store_id)))
            .await?;
        validate_sku(sku)?;
        validate_store_id(store_id)?;
        if quantity < 0 {
            return Err(InventoryError::NegativeQuantity(quantity));
        }

        let (product, store) = self.resolve(sku, store_id, write_failed).await?;
        let saved = self
            .write_with_retry(OP_SET, product.id, store.id, |current| {
                let record = current.unwrap_or_else(|| InventoryRecord::new(product.id, store.id));
                Ok(record.with_quantity(quantity))
            })
            .await?;

        tracing::info!(
            sku,
            %store_id,
            quantity,
            version = %saved.version,
            "inventory quantity set"
        );
        Ok(enrich(&saved, Some(&product), Some(&store)))
    }

    async fn adjust_quantity_inner(
        &self,
        sku: &str,
        store_id: StoreId,
        adjustment: i64,
        caller: &Caller,
    ) -> Result<InventoryView, InventoryError> {
        self.gate
            .authorize(caller, AccessRequirement::Store(Some(store_id)))
            .await?;
        validate_sku(sku)?;
        validate_store_id(store_id)?;
        if adjustment == 0 {
            return Err(InventoryError::InvalidAdjustment {
                adjustment,
                reason: "Adjustment must not be zero".to_string(),
            });
        }

        let (product, store) = self.resolve(sku, store_id, write_failed).await?;
        let saved = self
            .write_with_retry(OP_ADJUST, product.id, store.id, |current| {
                let record = current.ok_or_else(|| InventoryError::InventoryNotFound {
                    sku: sku.to_string(),
                    store_id,
                })?;
                let current = record.available_qty;
                let would_be = current.checked_add(adjustment).ok_or_else(|| {
                    InventoryError::InvalidAdjustment {
                        adjustment,
                        reason: "Adjustment exceeds the representable stock range".to_string(),
                    }
                })?;
                if would_be < 0 {
                    return Err(InventoryError::InsufficientStock {
                        current,
                        adjustment,
                        would_be,
                    });
                }
                Ok(record.with_quantity(would_be))
            })
            .await?;

        tracing::info!(
            sku,
            %store_id,
            adjustment,
            quantity = saved.available_qty,
            version = %saved.version,
            "inventory quantity adjusted"
        );
        Ok(enrich(&saved, Some(&product), Some(&store)))
    }

    /// Runs the read-compute-conditional-write cycle until it commits, a
    /// business rule rejects the fresh base, or the retry budget runs out.
    async fn write_with_retry<F>(
        &self,
        operation: &'static str,
        product_id: ProductId,
        store_id: StoreId,
        compute: F,
    ) -> Result<InventoryRecord, InventoryError>
    where
        F: Fn(Option<InventoryRecord>) -> Result<InventoryRecord, InventoryError> + Send + Sync,
    {
        let mut attempt = 1;
        loop {
            let current = self
                .repository
                .load(product_id, store_id)
                .await
                .map_err(write_failed)?;
            let candidate = compute(current)?;

            let conflict = match self.repository.conditional_save(candidate).await {
                Ok(saved) => return Ok(saved),
                Err(e) if e.is_version_conflict() => e,
                Err(e) => return Err(write_failed(e)),
            };

            metrics::counter!("inventory_version_conflicts_total", "operation" => operation)
                .increment(1);

            if !self.retry.allows_retry_after(attempt) {
                metrics::counter!("inventory_retries_exhausted_total", "operation" => operation)
                    .increment(1);
                tracing::error!(attempts = attempt, "inventory write retries exhausted");
                return Err(InventoryError::operation_failed(
                    format!("Concurrent updates did not settle after {attempt} attempts"),
                    Some(conflict),
                ));
            }

            let delay = self.retry.backoff_for(attempt);
            tracing::warn!(attempt, ?delay, "version conflict on inventory write, retrying");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    async fn resolve(
        &self,
        sku: &str,
        store_id: StoreId,
        on_storage_error: fn(StoreError) -> InventoryError,
    ) -> Result<(Product, Store), InventoryError> {
        let product = self.find_product(sku, on_storage_error).await?;
        let store = self
            .stores
            .find_by_id(store_id)
            .await
            .map_err(on_storage_error)?
            .ok_or(InventoryError::StoreNotFound(store_id))?;
        Ok((product, store))
    }

    async fn find_product(
        &self,
        sku: &str,
        on_storage_error: fn(StoreError) -> InventoryError,
    ) -> Result<Product, InventoryError> {
        self.products
            .find_by_sku(sku)
            .await
            .map_err(on_storage_error)?
            .ok_or_else(|| InventoryError::ProductNotFound(sku.to_string()))
    }
}

fn validate_sku(sku: &str) -> Result<(), InventoryError> {
    if sku.trim().is_empty() {
        return Err(InventoryError::InvalidSku);
    }
    Ok(())
}

fn validate_store_id(store_id: StoreId) -> Result<(), InventoryError> {
    if !store_id.is_valid() {
        return Err(InventoryError::InvalidStoreId(store_id));
    }
    Ok(())
}

fn storage_unavailable(e: StoreError) -> InventoryError {
    tracing::error!(error = %e, "inventory storage read failed");
    InventoryError::StorageUnavailable(e)
}

fn write_failed(e: StoreError) -> InventoryError {
    tracing::error!(error = %e, "inventory storage write path failed");
    InventoryError::operation_failed("Inventory storage rejected the update", Some(e))
}

fn record_mutation(
    operation: &'static str,
    started: Instant,
    result: &Result<InventoryView, InventoryError>,
) {
    metrics::histogram!("inventory_mutation_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
    if result.is_ok() {
        metrics::counter!("inventory_mutations_total", "operation" => operation).increment(1);
    }
}
