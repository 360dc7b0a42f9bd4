use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    InventoryId, InventoryRecord, Product, ProductCatalog, ProductId, Result, Role, Store,
    StoreDirectory, StoreError, StoreId, User, UserDirectory, UserId, Version,
    repository::InventoryRepository,
};

const INVENTORY_COLUMNS: &str = "id, product_id, store_id, available_qty, version, updated_at";

/// Runs the schema migrations shipped in `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// PostgreSQL-backed inventory repository.
///
/// Conditional writes are single statements guarded by the version column,
/// so the compare-and-swap is atomic without an explicit transaction.
#[derive(Clone)]
pub struct PostgresInventoryRepository {
    pool: PgPool,
}

impl PostgresInventoryRepository {
    /// Creates a new PostgreSQL inventory repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        run_migrations(&self.pool).await
    }

    fn row_to_record(row: PgRow) -> Result<InventoryRecord> {
        Ok(InventoryRecord {
            id: Some(InventoryId::new(row.try_get("id")?)),
            product_id: ProductId::new(row.try_get("product_id")?),
            store_id: StoreId::new(row.try_get("store_id")?),
            available_qty: row.try_get("available_qty")?,
            version: Version::new(row.try_get("version")?),
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl InventoryRepository for PostgresInventoryRepository {
    async fn load(
        &self,
        product_id: ProductId,
        store_id: StoreId,
    ) -> Result<Option<InventoryRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = $1 AND store_id = $2"
        ))
        .bind(product_id.as_i64())
        .bind(store_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn conditional_save(&self, record: InventoryRecord) -> Result<InventoryRecord> {
        let next_version = record.version.next();
        let now = Utc::now();

        let row = match record.id {
            None => {
                // A concurrent insert for the same key leaves no returned row
                sqlx::query(&format!(
                    r#"
                    INSERT INTO inventory (product_id, store_id, available_qty, version, updated_at)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (product_id, store_id) DO NOTHING
                    RETURNING {INVENTORY_COLUMNS}
                    "#
                ))
                .bind(record.product_id.as_i64())
                .bind(record.store_id.as_i64())
                .bind(record.available_qty)
                .bind(next_version.as_i64())
                .bind(now)
                .fetch_optional(&self.pool)
                .await?
            }
            Some(id) => {
                sqlx::query(&format!(
                    r#"
                    UPDATE inventory
                    SET available_qty = $1, version = $2, updated_at = $3
                    WHERE id = $4 AND version = $5
                    RETURNING {INVENTORY_COLUMNS}
                    "#
                ))
                .bind(record.available_qty)
                .bind(next_version.as_i64())
                .bind(now)
                .bind(id.as_i64())
                .bind(record.version.as_i64())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        match row {
            Some(row) => Self::row_to_record(row),
            None => Err(StoreError::VersionConflict {
                product_id: record.product_id,
                store_id: record.store_id,
                expected: record.version,
            }),
        }
    }

    async fn find_by_product(&self, product_id: ProductId) -> Result<Vec<InventoryRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE product_id = $1 ORDER BY store_id ASC"
        ))
        .bind(product_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_record).collect()
    }
}

/// PostgreSQL-backed product, store and user lookups.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Creates a new PostgreSQL catalog.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            active: row.try_get("is_active")?,
        })
    }

    fn row_to_store(row: PgRow) -> Result<Store> {
        Ok(Store {
            id: StoreId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            active: row.try_get("is_active")?,
        })
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            role: role.parse::<Role>()?,
            active: row.try_get("is_active")?,
        })
    }
}

#[async_trait]
impl ProductCatalog for PostgresCatalog {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, sku, name, description, is_active FROM products WHERE sku = $1",
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            "SELECT id, sku, name, description, is_active FROM products WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }
}

#[async_trait]
impl StoreDirectory for PostgresCatalog {
    async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>> {
        let row = sqlx::query("SELECT id, name, is_active FROM stores WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_store).transpose()
    }

    async fn exists_by_id(&self, id: StoreId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stores WHERE id = $1)")
            .bind(id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UserDirectory for PostgresCatalog {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, role, is_active FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn has_store_permission(&self, username: &str, store_id: StoreId) -> Result<bool> {
        let granted: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM user_store_permissions p
                JOIN users u ON u.id = p.user_id
                WHERE u.username = $1 AND p.store_id = $2
            )
            "#,
        )
        .bind(username)
        .bind(store_id.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(granted)
    }
}
