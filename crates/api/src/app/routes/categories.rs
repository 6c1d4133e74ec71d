use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use catalog_auth::Permission;
use catalog_core::CategoryId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_category).get(list_categories))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.categories.list().await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.categories.get(id).await {
        Ok(Some(dto)) => (StatusCode::OK, Json(dto)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::CategoryRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("categories.create")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    if let Err(msg) = body.validate() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
    }

    match services.categories.add(body.name).await {
        Ok(dto) => (StatusCode::CREATED, Json(dto)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CategoryRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("categories.update")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    if let Err(msg) = body.validate() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
    }

    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.categories.update(id, body.name).await {
        Ok(dto) => (StatusCode::OK, Json(dto)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("categories.delete")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.categories.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
