use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};

use stockyard_catalog::{Product, ProductPatch};
use stockyard_core::ProductId;
use stockyard_infra::retry;
use stockyard_infra::store::ProductStore;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products))
        .route("/product", post(create_product))
        .route("/product/update/:id", put(update_product))
        .route("/product/delete/:id", delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let products = retry::with_backoff(services.read_backoff, || services.products.list()).await;
    match products {
        Ok(products) => (StatusCode::OK, Json(products)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let product = match Product::new(
        body.name,
        body.description,
        body.attributes,
        body.weight,
        body.barcode,
    ) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let id = product.id;
    if let Err(e) = services.products.create(product).await {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_string() })),
    )
        .into_response()
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    if let Err(e) = patch.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.products.update(id, patch).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "updated" }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
        }
    };

    match services.products.delete(id).await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "deleted" }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
