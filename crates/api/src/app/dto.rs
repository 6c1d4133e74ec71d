use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use catalog_core::{CategoryId, ProductId, UserId};
use catalog_products::{Category, Product};

// -------------------------
// Request DTOs
// -------------------------

/// Full field set for create and replace-update (no partial patch).
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub duration_days: i64,
    pub price: Decimal,
    pub image_path: Option<String>,
    pub category_id: Uuid,
}

impl ProductRequest {
    /// Transfer-object boundary checks (field presence and lengths); the
    /// entity-level business rules live on `Product::validate`.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("the name field is required".to_string());
        }
        if self.name.len() > 100 {
            return Err("the name must be at most 100 characters long".to_string());
        }
        if self.description.as_ref().is_some_and(|d| d.len() > 500) {
            return Err("the description must be at most 500 characters long".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

impl CategoryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("the name field is required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

// -------------------------
// Transfer objects
// -------------------------

/// Product projection handed to the web layer (and serialized into audit
/// "new" snapshots).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
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

impl From<&Product> for ProductDto {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            creation_date: p.creation_date,
            created_by_user_id: p.created_by_user_id,
            start_date: p.start_date,
            duration_days: p.duration_days,
            price: p.price,
            image_path: p.image_path.clone(),
            category_id: p.category_id,
            category_name: p.category_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: CategoryId,
    pub name: String,
}

impl From<&Category> for CategoryDto {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn request(name: &str, description: Option<&str>) -> ProductRequest {
        ProductRequest {
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            start_date: Utc::now(),
            duration_days: 1,
            price: Decimal::ONE,
            image_path: None,
            category_id: Uuid::now_v7(),
        }
    }

    #[test]
    fn name_length_boundary() {
        assert!(request(&"x".repeat(100), None).validate().is_ok());
        assert!(request(&"x".repeat(101), None).validate().is_err());
        assert!(request("   ", None).validate().is_err());
    }

    #[test]
    fn description_length_boundary() {
        assert!(request("Laptop", Some("x".repeat(500).as_str())).validate().is_ok());
        assert!(request("Laptop", Some("x".repeat(501).as_str())).validate().is_err());
    }

    #[test]
    fn category_name_is_required() {
        assert!(CategoryRequest { name: "Books".to_string() }.validate().is_ok());
        assert!(CategoryRequest { name: "  ".to_string() }.validate().is_err());
    }
}
