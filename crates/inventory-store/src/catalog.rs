//! Read-only catalog lookups: products, stores, users and store grants.
//!
//! The inventory core never writes these; it only resolves identities
//! through the traits below.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{ProductId, Result, StoreError, StoreId, UserId};

/// A catalog product. `sku` is the unique, immutable business key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

impl Product {
    /// Creates an active product without description.
    pub fn new(id: ProductId, sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            sku: sku.into(),
            name: name.into(),
            description: None,
            active: true,
        }
    }
}

/// A physical store holding inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub active: bool,
}

impl Store {
    /// Creates an active store.
    pub fn new(id: StoreId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
        }
    }
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Implicit access to every store.
    Admin,
    /// Access only to explicitly granted stores.
    StoreUser,
}

impl Role {
    /// Returns the stored name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::StoreUser => "STORE_USER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "STORE_USER" => Ok(Role::StoreUser),
            other => Err(StoreError::InvalidRecord(format!("unknown role '{other}'"))),
        }
    }
}

/// A user account as seen by the authorization gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub active: bool,
}

impl User {
    /// Creates an active user.
    pub fn new(id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            active: true,
        }
    }

    /// Returns the user with its account disabled.
    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns true if the user has the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Product lookup.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Finds a product by its SKU.
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>>;

    /// Finds a product by id.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>>;
}

/// Store lookup.
#[async_trait]
pub trait StoreDirectory: Send + Sync {
    /// Finds a store by id.
    async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>>;

    /// Checks whether a store exists.
    async fn exists_by_id(&self, id: StoreId) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// User and store-permission lookup.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Checks whether the user holds an explicit grant for the store.
    async fn has_store_permission(&self, username: &str, store_id: StoreId) -> Result<bool>;
}

#[async_trait]
impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>> {
        (**self).find_by_sku(sku).await
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        (**self).find_by_id(id).await
    }
}

#[async_trait]
impl<T: StoreDirectory + ?Sized> StoreDirectory for Arc<T> {
    async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>> {
        (**self).find_by_id(id).await
    }

    async fn exists_by_id(&self, id: StoreId) -> Result<bool> {
        (**self).exists_by_id(id).await
    }
}

#[async_trait]
impl<T: UserDirectory + ?Sized> UserDirectory for Arc<T> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        (**self).find_by_username(username).await
    }

    async fn has_store_permission(&self, username: &str, store_id: StoreId) -> Result<bool> {
        (**self).has_store_permission(username, store_id).await
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    products: HashMap<ProductId, Product>,
    skus: HashMap<String, ProductId>,
    stores: HashMap<StoreId, Store>,
}

/// In-memory product and store catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub async fn insert_product(&self, product: Product) {
        let mut state = self.state.write().await;
        state.skus.insert(product.sku.clone(), product.id);
        state.products.insert(product.id, product);
    }

    /// Adds or replaces a store.
    pub async fn insert_store(&self, store: Store) {
        self.state.write().await.stores.insert(store.id, store);
    }

    /// Removes a store, leaving any inventory that references it dangling.
    pub async fn remove_store(&self, id: StoreId) {
        self.state.write().await.stores.remove(&id);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>> {
        let state = self.state.read().await;
        Ok(state
            .skus
            .get(sku)
            .and_then(|id| state.products.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }
}

#[async_trait]
impl StoreDirectory for InMemoryCatalog {
    async fn find_by_id(&self, id: StoreId) -> Result<Option<Store>> {
        Ok(self.state.read().await.stores.get(&id).cloned())
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: HashMap<String, User>,
    grants: HashMap<String, HashSet<StoreId>>,
}

/// In-memory user directory with per-user store grants.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub async fn insert_user(&self, user: User) {
        self.state
            .write()
            .await
            .users
            .insert(user.username.clone(), user);
    }

    /// Grants a user access to a store.
    pub async fn grant(&self, username: &str, store_id: StoreId) {
        self.state
            .write()
            .await
            .grants
            .entry(username.to_string())
            .or_default()
            .insert(store_id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(username).cloned())
    }

    async fn has_store_permission(&self, username: &str, store_id: StoreId) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .get(username)
            .is_some_and(|stores| stores.contains(&store_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_stored_name() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("STORE_USER".parse::<Role>().unwrap(), Role::StoreUser);
        assert_eq!(Role::StoreUser.to_string(), "STORE_USER");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = "SUPERVISOR".parse::<Role>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord(_)));
    }

    #[test]
    fn role_serializes_in_screaming_case() {
        let json = serde_json::to_string(&Role::StoreUser).unwrap();
        assert_eq!(json, "\"STORE_USER\"");
    }

    #[tokio::test]
    async fn catalog_resolves_products_by_sku_and_id() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_product(Product::new(ProductId::new(7), "SKU-7", "Lamp"))
            .await;

        let by_sku = catalog.find_by_sku("SKU-7").await.unwrap().unwrap();
        assert_eq!(by_sku.id, ProductId::new(7));

        let by_id = ProductCatalog::find_by_id(&catalog, ProductId::new(7))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id.name, "Lamp");

        assert!(catalog.find_by_sku("SKU-8").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_existence_follows_inserts_and_removals() {
        let catalog = InMemoryCatalog::new();
        catalog
            .insert_store(Store::new(StoreId::new(1), "Downtown"))
            .await;

        assert!(catalog.exists_by_id(StoreId::new(1)).await.unwrap());
        assert!(!catalog.exists_by_id(StoreId::new(2)).await.unwrap());

        catalog.remove_store(StoreId::new(1)).await;
        assert!(!catalog.exists_by_id(StoreId::new(1)).await.unwrap());
    }

    #[tokio::test]
    async fn grants_are_per_user_and_store() {
        let users = InMemoryUserDirectory::new();
        users
            .insert_user(User::new(UserId::new(1), "clerk", Role::StoreUser))
            .await;
        users.grant("clerk", StoreId::new(1)).await;

        assert!(
            users
                .has_store_permission("clerk", StoreId::new(1))
                .await
                .unwrap()
        );
        assert!(
            !users
                .has_store_permission("clerk", StoreId::new(2))
                .await
                .unwrap()
        );
        assert!(
            !users
                .has_store_permission("nobody", StoreId::new(1))
                .await
                .unwrap()
        );
    }
}
