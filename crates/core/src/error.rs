//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, missing entities). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Product price is negative.
    #[error("price cannot be negative")]
    InvalidPrice,

    /// Product duration is zero or negative.
    #[error("duration must be a positive number of days")]
    InvalidDuration,

    /// Product start date lies in the past.
    ///
    /// The corresponding check is currently disabled (see `Product::validate`);
    /// the variant is kept so the rule can be re-enabled as a product decision.
    #[error("start date cannot be in the past")]
    InvalidStartDate,

    /// No image file was supplied (or it was empty).
    #[error("image file is required")]
    MissingImage,

    /// Image extension outside the accepted set.
    #[error("image must be in JPG, JPEG, or PNG format")]
    InvalidImageFormat,

    /// Image payload exceeds the size cap.
    #[error("image size cannot exceed 1 MiB")]
    ImageTooLarge,

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested entity was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
