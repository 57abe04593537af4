//! Persistence for products and user accounts.
//!
//! Handlers talk to the [`ProductStore`] and [`UserStore`] traits. Two backends
//! implement them: [`postgres`] for real deployments and [`memory`] for running
//! without a database (and for tests).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, Product, ProductPatch, ProductQuery, User, UserChanges};

pub use memory::{MemoryProductStore, MemoryUserStore};
pub use postgres::{PgProductStore, PgUserStore};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key (product code, user email) is already taken.
    #[error("{0}")]
    Duplicate(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub(crate) const DUPLICATE_PRODUCT_CODE: &str = "Product code already exists";
pub(crate) const DUPLICATE_EMAIL: &str = "Email already registered";

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: Product) -> Result<Product, StoreError>;
    /// Newest `date_added` first.
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, StoreError>;
    async fn find(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, StoreError>;
    /// Returns `false` when no product had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError>;
}
