use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::{CategoryId, DomainError, DomainResult, ProductId, UserId};

/// Extensions accepted for product images (matched case-insensitively).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Maximum accepted image payload: 1 MiB, inclusive.
pub const MAX_IMAGE_BYTES: u64 = 1024 * 1024;

/// A catalog listing with a visibility window.
///
/// `category_name` is a denormalized snapshot of the category's name taken on
/// every write path that touches `category_id`. It is never resolved lazily at
/// read time and can go stale if the category is renamed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub creation_date: DateTime<Utc>,
    pub created_by_user_id: UserId,
    pub start_date: DateTime<Utc>,
    pub duration_days: i64,
    pub price: Decimal,
    pub image_path: Option<String>,
    pub category_id: CategoryId,
    pub category_name: String,
}

impl Product {
    /// Check the entity-level business rules.
    ///
    /// Called on every create and update, after DTO mapping and before
    /// persistence.
    pub fn validate(&self) -> DomainResult<()> {
        if self.price < Decimal::ZERO {
            return Err(DomainError::InvalidPrice);
        }

        if self.duration_days <= 0 {
            return Err(DomainError::InvalidDuration);
        }

        // if self.start_date < Utc::now() {
        //     return Err(DomainError::InvalidStartDate);
        // }

        Ok(())
    }

    /// Whether the product is on display at `now`.
    ///
    /// True iff `now` falls within `[start_date, start_date + duration_days]`
    /// (both boundaries inclusive) and the category snapshot resolved at last
    /// write. A product whose `category_id` never resolved has an empty
    /// `category_name` and is never visible.
    pub fn is_currently_visible(&self, now: DateTime<Utc>) -> bool {
        let end = Duration::try_days(self.duration_days)
            .and_then(|d| self.start_date.checked_add_signed(d));

        match end {
            Some(end) => now >= self.start_date && now <= end && !self.category_name.is_empty(),
            None => false,
        }
    }
}

/// Check the image constraint surface for an uploaded file.
///
/// The same limits are enforced a second time at the upload-handling boundary
/// in the infrastructure layer; both call sites share these constants.
pub fn validate_image(file_name: &str, len: u64) -> DomainResult<()> {
    if file_name.is_empty() || len == 0 {
        return Err(DomainError::MissingImage);
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension {
        Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => return Err(DomainError::InvalidImageFormat),
    }

    if len > MAX_IMAGE_BYTES {
        return Err(DomainError::ImageTooLarge);
    }

    Ok(())
}
