use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use catalog_auth::Permission;
use catalog_core::{CategoryId, DomainError, ProductId};

use crate::app::services::{AppServices, ProductInput, ServiceError};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/active", get(list_active_products))
        .route("/search", get(search_products))
        .route("/images", post(upload_image))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/history", get(update_history))
}

fn product_input(body: dto::ProductRequest) -> ProductInput {
    ProductInput {
        name: body.name,
        description: body.description,
        start_date: body.start_date,
        duration_days: body.duration_days,
        price: body.price,
        image_path: body.image_path,
        category_id: CategoryId::from_uuid(body.category_id),
    }
}

/// Full catalog listing (admin view; includes inactive products).
pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(query): Query<dto::ProductListQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("products.list")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let category = query.category_id.map(CategoryId::from_uuid);
    match services.products.list_products(category).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Products currently on display (any authenticated user).
pub async fn list_active_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ProductListQuery>,
) -> axum::response::Response {
    let category = query.category_id.map(CategoryId::from_uuid);
    match services.products.list_active_products_by_category(category).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> axum::response::Response {
    match services.products.search_products(&query.q).await {
        Ok(items) => (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.products.get_product(id).await {
        Ok(Some(dto)) => (StatusCode::OK, Json(dto)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Json(body): Json<dto::ProductRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("products.create")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    if let Err(msg) = body.validate() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
    }

    match services
        .products
        .add_product(product_input(body), principal.user_id())
        .await
    {
        Ok(dto) => (StatusCode::CREATED, Json(dto)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ProductRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("products.update")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    if let Err(msg) = body.validate() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", msg);
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services
        .products
        .update_product(id, product_input(body), principal.user_id())
        .await
    {
        Ok(dto) => (StatusCode::OK, Json(dto)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("products.delete")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.products.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Audit trail for one product (admin surface).
pub async fn update_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("products.history")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.products.update_history(id).await {
        Ok(rows) => (StatusCode::OK, Json(serde_json::json!({ "items": rows }))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Multipart image upload; responds with the stored public path.
pub async fn upload_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    mut multipart: Multipart,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require(&principal, &Permission::new("products.upload")) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
                    continue;
                };

                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(_) => {
                        return errors::json_error(
                            StatusCode::BAD_REQUEST,
                            "invalid_upload",
                            "failed to read uploaded file",
                        );
                    }
                };

                return match services.products.handle_image_upload(&file_name, &bytes).await {
                    Ok(path) => (
                        StatusCode::CREATED,
                        Json(serde_json::json!({ "image_path": path })),
                    )
                        .into_response(),
                    Err(e) => errors::service_error_to_response(e),
                };
            }
            Ok(None) => break,
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_upload",
                    "malformed multipart body",
                );
            }
        }
    }

    errors::service_error_to_response(ServiceError::Domain(DomainError::MissingImage))
}
