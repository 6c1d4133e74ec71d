//! In-memory store implementations for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use catalog_core::{CategoryId, ProductId};
use catalog_products::{Category, Product, ProductUpdateLog};

use super::{CategoryStore, ProductStore, StoreError, UpdateLogStore};

fn poisoned() -> StoreError {
    StoreError::Database("store lock poisoned".to_string())
}

/// In-memory product store.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn list(&self, category: Option<CategoryId>) -> Result<Vec<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|p| category.is_none_or(|c| p.category_id == c))
            .cloned()
            .collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn add(&self, product: &Product) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn search(&self, term: &str) -> Result<Vec<Product>, StoreError> {
        // Case-sensitive here; the Postgres store uses ILIKE. Sensitivity is
        // store-defined.
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|p| {
                p.name.contains(term)
                    || p.description.as_deref().is_some_and(|d| d.contains(term))
            })
            .cloned()
            .collect())
    }
}

/// In-memory category store.
#[derive(Debug, Default)]
pub struct InMemoryCategoryStore {
    inner: RwLock<HashMap<CategoryId, Category>>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().cloned().collect())
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn add(&self, category: &Category) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(category.id, category.clone());
        Ok(())
    }

    async fn update(&self, category: &Category) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&category.id) {
            Some(existing) => {
                *existing = category.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(&id).is_some())
    }

    async fn name_of(&self, id: CategoryId) -> Result<Option<String>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).map(|c| c.name.clone()))
    }
}

/// In-memory append-only update log.
#[derive(Debug, Default)]
pub struct InMemoryUpdateLogStore {
    inner: RwLock<Vec<ProductUpdateLog>>,
}

impl InMemoryUpdateLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UpdateLogStore for InMemoryUpdateLogStore {
    async fn append(&self, log: &ProductUpdateLog) -> Result<(), StoreError> {
        let mut rows = self.inner.write().map_err(|_| poisoned())?;
        rows.push(log.clone());
        Ok(())
    }

    async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductUpdateLog>, StoreError> {
        let rows = self.inner.read().map_err(|_| poisoned())?;
        Ok(rows
            .iter()
            .filter(|l| l.product_id == product_id)
            .cloned()
            .collect())
    }
}
