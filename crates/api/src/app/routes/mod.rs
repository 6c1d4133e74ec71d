use axum::{Router, routing::get};

pub mod categories;
pub mod products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products", products::router())
        .nest("/categories", categories::router())
}
