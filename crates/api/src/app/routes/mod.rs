use axum::{routing::get, Router};

pub mod analytics;
pub mod inventory;
pub mod products;
pub mod system;
pub mod warehouses;

/// Router for everything mounted under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(warehouses::router())
        .merge(products::router())
        .merge(inventory::router())
        .merge(analytics::router())
}
