use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use stockyard_catalog::Warehouse;
use stockyard_core::WarehouseId;
use stockyard_infra::retry;
use stockyard_infra::store::WarehouseStore;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/warehouses", get(list_warehouses))
        .route("/warehouse", post(create_warehouse))
        .route("/warehouse/update/:id", put(update_warehouse))
        .route("/warehouse/delete/:id", delete(delete_warehouse))
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let warehouses =
        retry::with_backoff(services.read_backoff, || services.warehouses.list()).await;
    match warehouses {
        Ok(warehouses) => (StatusCode::OK, Json(warehouses)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateWarehouseRequest>,
) -> axum::response::Response {
    let warehouse = match Warehouse::new(body.name, body.address, body.description) {
        Ok(w) => w,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let id = warehouse.id;
    if let Err(e) = services.warehouses.create(warehouse).await {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_string() })),
    )
        .into_response()
}

pub async fn update_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateWarehouseRequest>,
) -> axum::response::Response {
    let id: WarehouseId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    if body.address.trim().is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "address cannot be empty",
        );
    }

    match services.warehouses.update_address(id, body.address).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "updated" }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: WarehouseId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    match services.warehouses.delete(id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "deleted" }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
