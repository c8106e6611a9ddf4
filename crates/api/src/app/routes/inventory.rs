use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use stockyard_core::{ProductId, WarehouseId};
use stockyard_infra::retry;
use stockyard_infra::store::InventoryStore;
use stockyard_infra::PurchaseLine;
use stockyard_inventory::{record, InventoryRecord};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/inventory", post(upsert_inventory))
        .route("/inventory/update/:warehouse_id/:product_id", put(replenish))
        .route("/inventory/discount/:warehouse_id", put(set_discount))
        .route("/inventory/calculate/:warehouse_id", post(calculate_total))
        .route("/inventory/purchase/:warehouse_id", post(purchase))
        .route("/inventory/:warehouse_id", get(list_by_warehouse))
        .route(
            "/inventory/:warehouse_id/:product_id",
            get(get_record).delete(delete_record),
        )
}

pub async fn upsert_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::UpsertInventoryRequest>,
) -> axum::response::Response {
    let record = match InventoryRecord::new(
        ProductId::from_uuid(body.product_id),
        WarehouseId::from_uuid(body.warehouse_id),
        body.quantity,
        body.price,
        body.discount,
    ) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.inventory.upsert(record).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "status": "created" })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn replenish(
    Extension(services): Extension<Arc<AppServices>>,
    Path((warehouse_id, product_id)): Path<(String, String)>,
    Json(body): Json<dto::ReplenishRequest>,
) -> axum::response::Response {
    let Some((warehouse_id, product_id)) = parse_pair(&warehouse_id, &product_id) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid identifier");
    };

    if body.quantity <= 0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "quantity must be positive",
        );
    }

    match services
        .inventory
        .increment(product_id, warehouse_id, body.quantity)
        .await
    {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "updated" }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn set_discount(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse_id): Path<String>,
    Json(body): Json<dto::SetDiscountRequest>,
) -> axum::response::Response {
    let warehouse_id: WarehouseId = match warehouse_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    if let Err(e) = record::validate_discount(body.discount) {
        return errors::domain_error_to_response(e);
    }
    if body.product_ids.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "product_ids cannot be empty",
        );
    }

    let product_ids: Vec<ProductId> =
        body.product_ids.into_iter().map(ProductId::from_uuid).collect();

    match services
        .inventory
        .set_discount(&product_ids, warehouse_id, body.discount)
        .await
    {
        Ok(updated) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "discount applied", "updated": updated })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_by_warehouse(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse_id): Path<String>,
    Query(page): Query<dto::PageParams>,
) -> axum::response::Response {
    let warehouse_id: WarehouseId = match warehouse_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    let limit = page.limit.unwrap_or(dto::DEFAULT_PAGE_LIMIT).clamp(1, 500);
    let offset = page.offset.unwrap_or(0).max(0);

    let records = retry::with_backoff(services.read_backoff, || {
        services.inventory.list_by_warehouse(warehouse_id, limit, offset)
    })
    .await;

    match records {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_record(
    Extension(services): Extension<Arc<AppServices>>,
    Path((warehouse_id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let Some((warehouse_id, product_id)) = parse_pair(&warehouse_id, &product_id) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid identifier");
    };

    let record = retry::with_backoff(services.read_backoff, || {
        services.inventory.get(product_id, warehouse_id)
    })
    .await;

    match record {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn calculate_total(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse_id): Path<String>,
    Json(body): Json<dto::ItemsRequest>,
) -> axum::response::Response {
    let warehouse_id: WarehouseId = match warehouse_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    let lines = to_lines(body);
    match services.processor.quote(warehouse_id, lines).await {
        Ok(total) => (StatusCode::OK, Json(serde_json::json!({ "total": total }))).into_response(),
        Err(e) => errors::purchase_error_to_response(e),
    }
}

pub async fn purchase(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse_id): Path<String>,
    Json(body): Json<dto::ItemsRequest>,
) -> axum::response::Response {
    let warehouse_id: WarehouseId = match warehouse_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    let lines = to_lines(body);
    match services.processor.purchase(warehouse_id, lines).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => errors::purchase_error_to_response(e),
    }
}

pub async fn delete_record(
    Extension(services): Extension<Arc<AppServices>>,
    Path((warehouse_id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let Some((warehouse_id, product_id)) = parse_pair(&warehouse_id, &product_id) else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid identifier");
    };

    match services.inventory.delete(product_id, warehouse_id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "deleted" }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn parse_pair(warehouse_id: &str, product_id: &str) -> Option<(WarehouseId, ProductId)> {
    Some((warehouse_id.parse().ok()?, product_id.parse().ok()?))
}

fn to_lines(body: dto::ItemsRequest) -> Vec<PurchaseLine> {
    body.items
        .into_iter()
        .map(|(product_id, quantity)| PurchaseLine {
            product_id: ProductId::from_uuid(product_id),
            quantity,
        })
        .collect()
}
