use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use catalog_core::{ProductId, UserId};

/// Identifier of a product update log row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateLogId(Uuid);

impl UpdateLogId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UpdateLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for UpdateLogId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Append-only record of one product update: who changed it, when, and the
/// full before/after state as JSON snapshots.
///
/// Written exactly once per successful update; never mutated or deleted.
/// Deletes are intentionally not audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdateLog {
    pub id: UpdateLogId,
    pub product_id: ProductId,
    pub updated_by: UserId,
    pub updated_at: DateTime<Utc>,
    pub old_values: String,
    pub new_values: String,
}

impl ProductUpdateLog {
    /// Build a log row for an update happening now.
    pub fn record(
        product_id: ProductId,
        updated_by: UserId,
        old_values: String,
        new_values: String,
    ) -> Self {
        Self {
            id: UpdateLogId::new(),
            product_id,
            updated_by,
            updated_at: Utc::now(),
            old_values,
            new_values,
        }
    }
}
