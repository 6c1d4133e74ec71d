use serde::{Deserialize, Serialize};

use catalog_core::CategoryId;

/// A named grouping for products.
///
/// Names are unique by convention only; nothing enforces it. Deleting a
/// category that products still reference is allowed — the products keep
/// their `category_id` and their last `category_name` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
        }
    }
}
