use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use catalog_core::DomainError;

use crate::app::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(DomainError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "not found")
        }
        ServiceError::Domain(e @ (DomainError::InvalidPrice
        | DomainError::InvalidDuration
        | DomainError::InvalidStartDate)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        ServiceError::Domain(e @ (DomainError::MissingImage
        | DomainError::InvalidImageFormat
        | DomainError::ImageTooLarge)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_image", e.to_string())
        }
        ServiceError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", msg)
        }
        ServiceError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        ServiceError::Serialize(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "serialize_error",
            e.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
