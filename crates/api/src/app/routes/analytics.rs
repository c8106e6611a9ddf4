use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};

use stockyard_core::{ProductId, WarehouseId};
use stockyard_infra::retry;
use stockyard_infra::store::{AnalyticsStore, WarehouseStore};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/analytics/top", get(top_warehouses))
        .route("/analytics/:warehouse_id", get(warehouse_analytics))
        .route(
            "/analytics/delete/:warehouse_id/:product_id",
            delete(delete_analytics),
        )
}

pub async fn warehouse_analytics(
    Extension(services): Extension<Arc<AppServices>>,
    Path(warehouse_id): Path<String>,
) -> axum::response::Response {
    let warehouse_id: WarehouseId = match warehouse_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };

    let records = retry::with_backoff(services.read_backoff, || {
        services.analytics.list_by_warehouse(warehouse_id)
    })
    .await;

    match records {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn top_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::TopParams>,
) -> axum::response::Response {
    let limit = params.limit.unwrap_or(dto::DEFAULT_TOP_LIMIT).clamp(1, 100);

    let ranking = retry::with_backoff(services.read_backoff, || {
        services.analytics.top_warehouses(limit)
    })
    .await;

    let ranking = match ranking {
        Ok(ranking) => ranking,
        Err(e) => return errors::store_error_to_response(e),
    };

    // Enrich with master data where available; analytics rows survive
    // warehouse deletion, so the address is optional.
    let mut rows = Vec::with_capacity(ranking.len());
    for entry in ranking {
        let warehouse = services.warehouses.get(entry.warehouse_id).await.ok();
        rows.push(serde_json::json!({
            "warehouse_id": entry.warehouse_id.to_string(),
            "address": warehouse.map(|w| w.address),
            "total_revenue": entry.total_revenue,
        }));
    }

    (StatusCode::OK, Json(rows)).into_response()
}

pub async fn delete_analytics(
    Extension(services): Extension<Arc<AppServices>>,
    Path((warehouse_id, product_id)): Path<(String, String)>,
) -> axum::response::Response {
    let warehouse_id: WarehouseId = match warehouse_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid warehouse id")
        }
    };
    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    match services.analytics.delete(warehouse_id, product_id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "deleted" }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
