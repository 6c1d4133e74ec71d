//! Default seed data.

use catalog_products::Category;

use crate::store::{CategoryStore, StoreError};

/// Categories present in a fresh environment. Seed data, not a contract.
pub const DEFAULT_CATEGORY_NAMES: [&str; 3] = ["Electronics", "Home Appliances", "Books"];

/// Populate the default categories when the store is empty. Idempotent.
pub async fn ensure_default_categories(store: &dyn CategoryStore) -> Result<(), StoreError> {
    if !store.list().await?.is_empty() {
        return Ok(());
    }

    for name in DEFAULT_CATEGORY_NAMES {
        store.add(&Category::new(name)).await?;
    }
    tracing::info!("seeded {} default categories", DEFAULT_CATEGORY_NAMES.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryCategoryStore;

    #[tokio::test]
    async fn seeds_empty_store_once() {
        let store = InMemoryCategoryStore::new();

        ensure_default_categories(&store).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 3);

        // Second run is a no-op.
        ensure_default_categories(&store).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn does_not_touch_populated_stores() {
        let store = InMemoryCategoryStore::new();
        store.add(&Category::new("Clothing")).await.unwrap();

        ensure_default_categories(&store).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Clothing".to_string()]);
    }
}
