//! Store abstractions for products, categories, and the update audit trail.
//!
//! Every operation maps to a single statement against the backing store, so
//! individual calls are atomic; multi-step sequences (e.g. update + audit
//! append) are **not** wrapped in a transaction — the crash window between
//! them is an accepted property of the design.

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::{CategoryId, ProductId};
use catalog_products::{Category, Product, ProductUpdateLog};

pub mod memory;
pub mod postgres;

/// Infrastructure-level store failure.
///
/// Deterministic business failures (validation, not-found) are **not**
/// represented here; stores report row presence via `Option`/`bool` and let
/// the service layer decide what absence means.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// Product rows: CRUD plus the filtered queries the services need.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products, optionally restricted to one category (inclusion only).
    async fn list(&self, category: Option<CategoryId>) -> Result<Vec<Product>, StoreError>;

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn add(&self, product: &Product) -> Result<(), StoreError>;

    /// Overwrite all fields of the row with `product.id`. Returns whether a
    /// row matched.
    async fn update(&self, product: &Product) -> Result<bool, StoreError>;

    /// Returns whether a row matched.
    async fn delete(&self, id: ProductId) -> Result<bool, StoreError>;

    /// Substring match against name OR description. Case sensitivity is
    /// store-defined; no ordering guarantee beyond the store default.
    async fn search(&self, term: &str) -> Result<Vec<Product>, StoreError>;
}

/// Category rows.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>, StoreError>;

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    async fn add(&self, category: &Category) -> Result<(), StoreError>;

    /// Returns whether a row matched.
    async fn update(&self, category: &Category) -> Result<bool, StoreError>;

    /// Returns whether a row matched. No check for referencing products.
    async fn delete(&self, id: CategoryId) -> Result<bool, StoreError>;

    /// Resolve a category's current name, if the id exists.
    async fn name_of(&self, id: CategoryId) -> Result<Option<String>, StoreError>;
}

/// Append-only product update audit trail.
#[async_trait]
pub trait UpdateLogStore: Send + Sync {
    async fn append(&self, log: &ProductUpdateLog) -> Result<(), StoreError>;

    async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductUpdateLog>, StoreError>;
}
