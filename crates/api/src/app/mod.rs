//! HTTP API application wiring (Axum router + service wiring).
//!
//! Folder structure:
//! - `services.rs`: infrastructure wiring (stores + purchase processor)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app() -> Router {
    let services = Arc::new(services::build_services().await);
    app_with_services(services)
}

/// Router over explicitly provided services (tests build in-memory wiring
/// directly through this).
pub fn app_with_services(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .layer(Extension(services)),
        )
}
