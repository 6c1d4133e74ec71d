//! Postgres-backed store implementations.
//!
//! Expected schema (managed outside this crate):
//!
//! - `products(id uuid PK, name text, description text NULL,
//!   creation_date timestamptz, created_by_user_id uuid,
//!   start_date timestamptz, duration_days bigint, price numeric,
//!   image_path text NULL, category_id uuid, category_name text)`
//! - `categories(id uuid PK, name text)`
//! - `product_update_log(id uuid PK, product_id uuid, updated_by uuid,
//!   updated_at timestamptz, old_values text, new_values text)`
//!
//! Every operation is a single statement, so it is individually atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use catalog_core::{CategoryId, ProductId, UserId};
use catalog_products::{Category, Product, ProductUpdateLog, UpdateLogId};

use super::{CategoryStore, ProductStore, StoreError, UpdateLogStore};

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    StoreError::Database(format!("{operation}: {e}"))
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        creation_date: row.try_get::<DateTime<Utc>, _>("creation_date")?,
        created_by_user_id: UserId::from_uuid(row.try_get::<Uuid, _>("created_by_user_id")?),
        start_date: row.try_get::<DateTime<Utc>, _>("start_date")?,
        duration_days: row.try_get("duration_days")?,
        price: row.try_get::<Decimal, _>("price")?,
        image_path: row.try_get("image_path")?,
        category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
        category_name: row.try_get("category_name")?,
    })
}

/// Postgres product store.
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn list(&self, category: Option<CategoryId>) -> Result<Vec<Product>, StoreError> {
        let category_param: Option<Uuid> = category.map(|c| *c.as_uuid());

        let rows = sqlx::query(
            r#"
            SELECT id, name, description, creation_date, created_by_user_id,
                   start_date, duration_days, price, image_path,
                   category_id, category_name
            FROM products
            WHERE ($1::uuid IS NULL OR category_id = $1)
            "#,
        )
        .bind(category_param)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter()
            .map(|r| product_from_row(r).map_err(|e| map_sqlx_error("list_products", e)))
            .collect()
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, creation_date, created_by_user_id,
                   start_date, duration_days, price, image_path,
                   category_id, category_name
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        row.map(|r| product_from_row(&r).map_err(|e| map_sqlx_error("get_product", e)))
            .transpose()
    }

    async fn add(&self, product: &Product) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, creation_date, created_by_user_id,
                start_date, duration_days, price, image_path,
                category_id, category_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.creation_date)
        .bind(product.created_by_user_id.as_uuid())
        .bind(product.start_date)
        .bind(product.duration_days)
        .bind(product.price)
        .bind(&product.image_path)
        .bind(product.category_id.as_uuid())
        .bind(&product.category_name)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("add_product", e))?;

        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                creation_date = $4,
                created_by_user_id = $5,
                start_date = $6,
                duration_days = $7,
                price = $8,
                image_path = $9,
                category_id = $10,
                category_name = $11
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.creation_date)
        .bind(product.created_by_user_id.as_uuid())
        .bind(product.start_date)
        .bind(product.duration_days)
        .bind(product.price)
        .bind(&product.image_path)
        .bind(product.category_id.as_uuid())
        .bind(&product.category_name)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, term: &str) -> Result<Vec<Product>, StoreError> {
        // ILIKE: case-insensitive in this store. Sensitivity is store-defined.
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, creation_date, created_by_user_id,
                   start_date, duration_days, price, image_path,
                   category_id, category_name
            FROM products
            WHERE name ILIKE '%' || $1 || '%'
               OR description ILIKE '%' || $1 || '%'
            "#,
        )
        .bind(term)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("search_products", e))?;

        rows.iter()
            .map(|r| product_from_row(r).map_err(|e| map_sqlx_error("search_products", e)))
            .collect()
    }
}

/// Postgres category store.
pub struct PostgresCategoryStore {
    pool: PgPool,
}

impl PostgresCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
    })
}

#[async_trait]
impl CategoryStore for PostgresCategoryStore {
    async fn list(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM categories")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;

        rows.iter()
            .map(|r| category_from_row(r).map_err(|e| map_sqlx_error("list_categories", e)))
            .collect()
    }

    async fn get(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;

        row.map(|r| category_from_row(&r).map_err(|e| map_sqlx_error("get_category", e)))
            .transpose()
    }

    async fn add(&self, category: &Category) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("add_category", e))?;

        Ok(())
    }

    async fn update(&self, category: &Category) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_category", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: CategoryId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn name_of(&self, id: CategoryId) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT name FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("category_name", e))?;

        row.map(|r| r.try_get("name").map_err(|e| map_sqlx_error("category_name", e)))
            .transpose()
    }
}

/// Postgres update log store (append-only).
pub struct PostgresUpdateLogStore {
    pool: PgPool,
}

impl PostgresUpdateLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn update_log_from_row(row: &PgRow) -> Result<ProductUpdateLog, sqlx::Error> {
    Ok(ProductUpdateLog {
        id: UpdateLogId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        updated_by: UserId::from_uuid(row.try_get::<Uuid, _>("updated_by")?),
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        old_values: row.try_get("old_values")?,
        new_values: row.try_get("new_values")?,
    })
}

#[async_trait]
impl UpdateLogStore for PostgresUpdateLogStore {
    async fn append(&self, log: &ProductUpdateLog) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO product_update_log (
                id, product_id, updated_by, updated_at, old_values, new_values
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(log.id.as_uuid())
        .bind(log.product_id.as_uuid())
        .bind(log.updated_by.as_uuid())
        .bind(log.updated_at)
        .bind(&log.old_values)
        .bind(&log.new_values)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_update_log", e))?;

        Ok(())
    }

    async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductUpdateLog>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, updated_by, updated_at, old_values, new_values
            FROM product_update_log
            WHERE product_id = $1
            ORDER BY updated_at
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_update_log", e))?;

        rows.iter()
            .map(|r| update_log_from_row(r).map_err(|e| map_sqlx_error("list_update_log", e)))
            .collect()
    }
}
