use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use catalog_core::{CategoryId, DomainError, ProductId, UserId};
use catalog_infra::{
    CategoryStore, ImageStore, ImageStoreError, InMemoryCategoryStore, InMemoryProductStore,
    InMemoryUpdateLogStore, PostgresCategoryStore, PostgresProductStore, PostgresUpdateLogStore,
    ProductStore, StoreError, UpdateLogStore, seed,
};
use catalog_products::{Category, Product, ProductUpdateLog, validate_image};

use crate::app::dto::{CategoryDto, ProductDto};

/// Failure of a service operation.
///
/// Validation and not-found failures surface to the caller as form errors;
/// store failures are logged with context and re-raised unchanged.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<ImageStoreError> for ServiceError {
    fn from(value: ImageStoreError) -> Self {
        match value {
            ImageStoreError::Invalid(e) => Self::Domain(e),
            ImageStoreError::Io(msg) => Self::Store(StoreError::Io(msg)),
        }
    }
}

/// Full field set accepted by create and replace-update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub duration_days: i64,
    pub price: Decimal,
    pub image_path: Option<String>,
    pub category_id: CategoryId,
}

/// Orchestrates validation, data access, audit logging, and image storage for
/// products.
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    categories: Arc<dyn CategoryStore>,
    update_log: Arc<dyn UpdateLogStore>,
    images: Arc<ImageStore>,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductStore>,
        categories: Arc<dyn CategoryStore>,
        update_log: Arc<dyn UpdateLogStore>,
        images: Arc<ImageStore>,
    ) -> Self {
        Self {
            products,
            categories,
            update_log,
            images,
        }
    }

    /// All products, optionally restricted to one category.
    pub async fn list_products(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<ProductDto>, ServiceError> {
        let products = self.products.list(category).await.map_err(|e| {
            tracing::error!(error = %e, "failed to list products");
            ServiceError::from(e)
        })?;

        Ok(products.iter().map(ProductDto::from).collect())
    }

    /// Products whose visibility window contains the current instant.
    pub async fn list_active_products(&self) -> Result<Vec<ProductDto>, ServiceError> {
        self.list_active_products_by_category(None).await
    }

    /// Same as [`Self::list_active_products`], optionally restricted to one
    /// category.
    pub async fn list_active_products_by_category(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<ProductDto>, ServiceError> {
        let now = Utc::now();
        let products = self.products.list(category).await.map_err(|e| {
            tracing::error!(error = %e, "failed to list active products");
            ServiceError::from(e)
        })?;

        Ok(products
            .iter()
            .filter(|p| p.is_currently_visible(now))
            .map(ProductDto::from)
            .collect())
    }

    /// Single product, or `None` when no row matches (absence, not an error).
    pub async fn get_product(&self, id: ProductId) -> Result<Option<ProductDto>, ServiceError> {
        let product = self.products.get(id).await.map_err(|e| {
            tracing::error!(error = %e, product_id = %id, "failed to get product");
            ServiceError::from(e)
        })?;

        Ok(product.as_ref().map(ProductDto::from))
    }

    /// Create one product. The category name is snapshotted from the category
    /// store; an unknown category id yields an empty snapshot rather than an
    /// error.
    pub async fn add_product(
        &self,
        input: ProductInput,
        created_by: UserId,
    ) -> Result<ProductDto, ServiceError> {
        let category_name = self.resolve_category_name(input.category_id).await?;

        let product = Product {
            id: ProductId::new(),
            name: input.name,
            description: input.description,
            creation_date: Utc::now(),
            created_by_user_id: created_by,
            start_date: input.start_date,
            duration_days: input.duration_days,
            price: input.price,
            image_path: input.image_path,
            category_id: input.category_id,
            category_name,
        };

        product.validate()?;

        self.products.add(&product).await.map_err(|e| {
            tracing::error!(error = %e, product = %product.name, "failed to add product");
            ServiceError::from(e)
        })?;

        tracing::info!(product = %product.name, user = %created_by, "product added");
        Ok(ProductDto::from(&product))
    }

    /// Replace-update one product and append exactly one audit row.
    ///
    /// The row update and the audit append are sequential single-row writes;
    /// they are not wrapped in one transaction.
    pub async fn update_product(
        &self,
        id: ProductId,
        input: ProductInput,
        updated_by: UserId,
    ) -> Result<ProductDto, ServiceError> {
        let existing = self
            .products
            .get(id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, product_id = %id, "failed to load product for update");
                ServiceError::from(e)
            })?
            .ok_or(DomainError::NotFound)?;

        let old_values = serde_json::to_string(&existing)?;

        let category_name = self.resolve_category_name(input.category_id).await?;

        let updated = Product {
            id,
            name: input.name,
            description: input.description,
            // Set once at creation; replace-update does not touch it.
            creation_date: existing.creation_date,
            created_by_user_id: existing.created_by_user_id,
            start_date: input.start_date,
            duration_days: input.duration_days,
            price: input.price,
            image_path: input.image_path,
            category_id: input.category_id,
            category_name,
        };

        updated.validate()?;

        let matched = self.products.update(&updated).await.map_err(|e| {
            tracing::error!(error = %e, product_id = %id, "failed to update product");
            ServiceError::from(e)
        })?;
        if !matched {
            return Err(DomainError::NotFound.into());
        }

        let dto = ProductDto::from(&updated);
        let new_values = serde_json::to_string(&dto)?;

        self.update_log
            .append(&ProductUpdateLog::record(id, updated_by, old_values, new_values))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, product_id = %id, "failed to append update log");
                ServiceError::from(e)
            })?;

        tracing::info!(product = %dto.name, user = %updated_by, "product updated");
        Ok(dto)
    }

    /// Delete one product. Deletes are not audited.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ServiceError> {
        let existing = self.products.get(id).await.map_err(|e| {
            tracing::error!(error = %e, product_id = %id, "failed to load product for delete");
            ServiceError::from(e)
        })?;
        if existing.is_none() {
            return Err(DomainError::NotFound.into());
        }

        self.products.delete(id).await.map_err(|e| {
            tracing::error!(error = %e, product_id = %id, "failed to delete product");
            ServiceError::from(e)
        })?;

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Substring search against name or description.
    pub async fn search_products(&self, term: &str) -> Result<Vec<ProductDto>, ServiceError> {
        let products = self.products.search(term).await.map_err(|e| {
            tracing::error!(error = %e, term, "failed to search products");
            ServiceError::from(e)
        })?;

        Ok(products.iter().map(ProductDto::from).collect())
    }

    /// Validate and store an uploaded image, returning its public path.
    pub async fn handle_image_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, ServiceError> {
        validate_image(file_name, bytes.len() as u64)?;

        let path = self.images.save(file_name, bytes).await?;
        tracing::info!(path = %path, "image stored");
        Ok(path)
    }

    /// Audit rows for one product (admin surface).
    pub async fn update_history(
        &self,
        id: ProductId,
    ) -> Result<Vec<ProductUpdateLog>, ServiceError> {
        let rows = self.update_log.list_for_product(id).await.map_err(|e| {
            tracing::error!(error = %e, product_id = %id, "failed to list update log");
            ServiceError::from(e)
        })?;

        Ok(rows)
    }

    async fn resolve_category_name(&self, id: CategoryId) -> Result<String, ServiceError> {
        let name = self.categories.name_of(id).await.map_err(|e| {
            tracing::error!(error = %e, category_id = %id, "failed to resolve category name");
            ServiceError::from(e)
        })?;

        // An unknown category id resolves to an empty snapshot, not an error.
        Ok(name.unwrap_or_default())
    }
}

/// Plain CRUD over categories.
pub struct CategoryService {
    categories: Arc<dyn CategoryStore>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryStore>) -> Self {
        Self { categories }
    }

    pub async fn list(&self) -> Result<Vec<CategoryDto>, ServiceError> {
        let categories = self.categories.list().await.map_err(|e| {
            tracing::error!(error = %e, "failed to list categories");
            ServiceError::from(e)
        })?;

        Ok(categories.iter().map(CategoryDto::from).collect())
    }

    pub async fn get(&self, id: CategoryId) -> Result<Option<CategoryDto>, ServiceError> {
        let category = self.categories.get(id).await.map_err(|e| {
            tracing::error!(error = %e, category_id = %id, "failed to get category");
            ServiceError::from(e)
        })?;

        Ok(category.as_ref().map(CategoryDto::from))
    }

    /// Create a category; the store assigns the id (any supplied id is
    /// ignored at the transfer-object boundary).
    pub async fn add(&self, name: String) -> Result<CategoryDto, ServiceError> {
        let category = Category::new(name);

        self.categories.add(&category).await.map_err(|e| {
            tracing::error!(error = %e, category = %category.name, "failed to add category");
            ServiceError::from(e)
        })?;

        Ok(CategoryDto::from(&category))
    }

    pub async fn update(&self, id: CategoryId, name: String) -> Result<CategoryDto, ServiceError> {
        let category = Category { id, name };

        let matched = self.categories.update(&category).await.map_err(|e| {
            tracing::error!(error = %e, category_id = %id, "failed to update category");
            ServiceError::from(e)
        })?;
        if !matched {
            return Err(DomainError::NotFound.into());
        }

        Ok(CategoryDto::from(&category))
    }

    /// Delete a category. Referencing products are intentionally not checked;
    /// they keep their `category_id` and last name snapshot.
    pub async fn delete(&self, id: CategoryId) -> Result<(), ServiceError> {
        let matched = self.categories.delete(id).await.map_err(|e| {
            tracing::error!(error = %e, category_id = %id, "failed to delete category");
            ServiceError::from(e)
        })?;
        if !matched {
            return Err(DomainError::NotFound.into());
        }

        Ok(())
    }
}

/// Application services shared across request handlers.
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub categories: Arc<CategoryService>,
}

/// Wire stores and services from the environment.
///
/// `USE_PERSISTENT_STORES=true` (with `DATABASE_URL`) selects Postgres;
/// anything else wires the in-memory stores (dev/test).
pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let upload_dir =
        std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/images".to_string());
    let images = Arc::new(ImageStore::new(upload_dir));

    let (products, categories, update_log): (
        Arc<dyn ProductStore>,
        Arc<dyn CategoryStore>,
        Arc<dyn UpdateLogStore>,
    ) = if use_persistent {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
        let pool = PgPool::connect(&database_url)
            .await
            .expect("failed to connect to Postgres");

        (
            Arc::new(PostgresProductStore::new(pool.clone())),
            Arc::new(PostgresCategoryStore::new(pool.clone())),
            Arc::new(PostgresUpdateLogStore::new(pool)),
        )
    } else {
        (
            Arc::new(InMemoryProductStore::new()),
            Arc::new(InMemoryCategoryStore::new()),
            Arc::new(InMemoryUpdateLogStore::new()),
        )
    };

    seed::ensure_default_categories(categories.as_ref())
        .await
        .expect("failed to seed default categories");

    AppServices {
        products: Arc::new(ProductService::new(
            products,
            categories.clone(),
            update_log,
            images,
        )),
        categories: Arc::new(CategoryService::new(categories)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    struct Harness {
        products: Arc<ProductService>,
        categories: Arc<CategoryService>,
        update_log: Arc<InMemoryUpdateLogStore>,
        electronics: CategoryId,
        _upload_dir: tempfile::TempDir,
    }

    async fn harness() -> Harness {
        let product_store = Arc::new(InMemoryProductStore::new());
        let category_store = Arc::new(InMemoryCategoryStore::new());
        let update_log = Arc::new(InMemoryUpdateLogStore::new());

        let upload_dir = tempfile::tempdir().unwrap();
        let images = Arc::new(ImageStore::new(upload_dir.path()));

        let electronics = Category::new("Electronics");
        category_store.add(&electronics).await.unwrap();

        Harness {
            products: Arc::new(ProductService::new(
                product_store,
                category_store.clone(),
                update_log.clone(),
                images,
            )),
            categories: Arc::new(CategoryService::new(category_store)),
            update_log,
            electronics: electronics.id,
            _upload_dir: upload_dir,
        }
    }

    fn input(category_id: CategoryId) -> ProductInput {
        ProductInput {
            name: "Laptop".to_string(),
            description: Some("Portable computer".to_string()),
            start_date: Utc::now(),
            duration_days: 10,
            price: Decimal::new(99999, 2),
            image_path: None,
            category_id,
        }
    }

    #[tokio::test]
    async fn add_product_snapshots_category_name() {
        let h = harness().await;

        let dto = h
            .products
            .add_product(input(h.electronics), UserId::new())
            .await
            .unwrap();

        assert_eq!(dto.category_name, "Electronics");
        assert_eq!(h.products.list_products(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_product_with_unknown_category_gets_empty_snapshot() {
        let h = harness().await;

        let dto = h
            .products
            .add_product(input(CategoryId::new()), UserId::new())
            .await
            .unwrap();

        assert_eq!(dto.category_name, "");
        // Never visible without a resolved category.
        assert!(h.products.list_active_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_product_rejects_invalid_fields() {
        let h = harness().await;

        let mut bad_price = input(h.electronics);
        bad_price.price = Decimal::new(-100, 2);
        let err = h.products.add_product(bad_price, UserId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidPrice)));

        let mut bad_duration = input(h.electronics);
        bad_duration.duration_days = 0;
        let err = h.products.add_product(bad_duration, UserId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidDuration)));

        assert!(h.products.list_products(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_product_is_not_found_and_unaudited() {
        let h = harness().await;
        let missing = ProductId::new();

        let err = h
            .products
            .update_product(missing, input(h.electronics), UserId::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound)));
        assert!(h.update_log.list_for_product(missing).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_writes_exactly_one_audit_row_with_snapshots() {
        let h = harness().await;
        let editor = UserId::new();

        let created = h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();

        let mut edit = input(h.electronics);
        edit.name = "Laptop Pro".to_string();
        edit.price = Decimal::new(129999, 2);
        h.products.update_product(created.id, edit, editor).await.unwrap();

        let rows = h.update_log.list_for_product(created.id).await.unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.product_id, created.id);
        assert_eq!(row.updated_by, editor);

        let old: serde_json::Value = serde_json::from_str(&row.old_values).unwrap();
        let new: serde_json::Value = serde_json::from_str(&row.new_values).unwrap();
        assert_eq!(old["name"], "Laptop");
        assert_eq!(new["name"], "Laptop Pro");
        assert_eq!(new["price"], "1299.99");
    }

    #[tokio::test]
    async fn update_preserves_creation_metadata() {
        let h = harness().await;
        let creator = UserId::new();

        let created = h.products.add_product(input(h.electronics), creator).await.unwrap();

        let updated = h
            .products
            .update_product(created.id, input(h.electronics), UserId::new())
            .await
            .unwrap();

        assert_eq!(updated.creation_date, created.creation_date);
        assert_eq!(updated.created_by_user_id, creator);
    }

    #[tokio::test]
    async fn update_refreshes_category_snapshot() {
        let h = harness().await;

        let created = h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();

        let books = h.categories.add("Books".to_string()).await.unwrap();
        let mut edit = input(h.electronics);
        edit.category_id = books.id;

        let updated = h.products.update_product(created.id, edit, UserId::new()).await.unwrap();
        assert_eq!(updated.category_name, "Books");
    }

    #[tokio::test]
    async fn category_rename_leaves_product_snapshot_stale() {
        let h = harness().await;

        let created = h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();

        h.categories
            .update(h.electronics, "Gadgets".to_string())
            .await
            .unwrap();

        // The snapshot is refreshed on product writes only.
        let fetched = h.products.get_product(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.category_name, "Electronics");
    }

    #[tokio::test]
    async fn delete_missing_product_is_not_found() {
        let h = harness().await;

        let err = h.products.delete_product(ProductId::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_row() {
        let h = harness().await;

        let keep = h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();
        let gone = h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();

        h.products.delete_product(gone.id).await.unwrap();

        let remaining = h.products.list_products(None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep.id);
    }

    #[tokio::test]
    async fn active_listing_respects_the_visibility_window() {
        let h = harness().await;

        // Started today, runs 10 days: active.
        let mut current = input(h.electronics);
        current.name = "Current".to_string();
        h.products.add_product(current, UserId::new()).await.unwrap();

        // Started just under 10 days ago: still inside the inclusive window.
        let mut last_day = input(h.electronics);
        last_day.name = "Last day".to_string();
        last_day.start_date = Utc::now() - Duration::days(10) + Duration::minutes(5);
        h.products.add_product(last_day, UserId::new()).await.unwrap();

        // Started 11 days ago with a 10-day window: expired.
        let mut expired = input(h.electronics);
        expired.name = "Expired".to_string();
        expired.start_date = Utc::now() - Duration::days(11);
        h.products.add_product(expired, UserId::new()).await.unwrap();

        // Starts tomorrow: not yet visible.
        let mut upcoming = input(h.electronics);
        upcoming.name = "Upcoming".to_string();
        upcoming.start_date = Utc::now() + Duration::days(1);
        h.products.add_product(upcoming, UserId::new()).await.unwrap();

        let mut active: Vec<String> = h
            .products
            .list_active_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        active.sort();

        assert_eq!(active, vec!["Current".to_string(), "Last day".to_string()]);
    }

    #[tokio::test]
    async fn active_listing_can_filter_by_category() {
        let h = harness().await;
        let books = h.categories.add("Books".to_string()).await.unwrap();

        h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();
        let mut novel = input(books.id);
        novel.name = "Novel".to_string();
        h.products.add_product(novel, UserId::new()).await.unwrap();

        let filtered = h
            .products
            .list_active_products_by_category(Some(books.id))
            .await
            .unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Novel");
    }

    #[tokio::test]
    async fn search_matches_name_and_description() {
        let h = harness().await;

        h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();
        let mut desk = input(h.electronics);
        desk.name = "Desk".to_string();
        desk.description = Some("Fits a Laptop".to_string());
        h.products.add_product(desk, UserId::new()).await.unwrap();

        assert_eq!(h.products.search_products("Laptop").await.unwrap().len(), 2);
        assert_eq!(h.products.search_products("Standing").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn image_upload_round_trip_and_rejections() {
        let h = harness().await;

        let path = h
            .products
            .handle_image_upload("photo.png", b"png bytes")
            .await
            .unwrap();
        assert!(path.starts_with("/images/"));
        assert!(path.ends_with(".png"));

        let err = h
            .products
            .handle_image_upload("photo.gif", &[0u8; 500 * 1024])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidImageFormat)));

        let err = h
            .products
            .handle_image_upload("photo.png", &vec![0u8; 2 * 1024 * 1024])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::ImageTooLarge)));

        let err = h.products.handle_image_upload("photo.png", b"").await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::MissingImage)));
    }

    #[tokio::test]
    async fn category_crud() {
        let h = harness().await;

        let created = h.categories.add("Clothing".to_string()).await.unwrap();
        assert_eq!(
            h.categories.get(created.id).await.unwrap().unwrap().name,
            "Clothing"
        );

        h.categories.update(created.id, "Apparel".to_string()).await.unwrap();
        assert_eq!(
            h.categories.get(created.id).await.unwrap().unwrap().name,
            "Apparel"
        );

        h.categories.delete(created.id).await.unwrap();
        assert!(h.categories.get(created.id).await.unwrap().is_none());

        let err = h.categories.update(created.id, "Gone".to_string()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound)));
        let err = h.categories.delete(created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn deleting_a_category_leaves_referencing_products_alone() {
        let h = harness().await;

        let created = h.products.add_product(input(h.electronics), UserId::new()).await.unwrap();

        h.categories.delete(h.electronics).await.unwrap();

        let fetched = h.products.get_product(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.category_id, h.electronics);
        assert_eq!(fetched.category_name, "Electronics");
    }
}
