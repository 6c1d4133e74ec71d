//! `catalog-infra` — persistence and file storage for the catalog.
//!
//! Store traits with two implementations each: in-memory (dev/test) and
//! Postgres (sqlx). Plus the filesystem image store and default seed data.

pub mod images;
pub mod seed;
pub mod store;

pub use images::{ImageStore, ImageStoreError};
pub use store::memory::{InMemoryCategoryStore, InMemoryProductStore, InMemoryUpdateLogStore};
pub use store::postgres::{PostgresCategoryStore, PostgresProductStore, PostgresUpdateLogStore};
pub use store::{CategoryStore, ProductStore, StoreError, UpdateLogStore};
