use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockyard_core::DomainError;
use stockyard_infra::store::StoreError;
use stockyard_infra::PurchaseError;

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

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::InsufficientStock => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", "not enough stock")
        }
        StoreError::Invalid(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "invalid_data", msg)
        }
        StoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
    }
}

pub fn purchase_error_to_response(err: PurchaseError) -> axum::response::Response {
    match err {
        PurchaseError::InvalidInput(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        PurchaseError::NotFound { product_id } => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("product {product_id} is not stocked in this warehouse"),
        ),
        PurchaseError::InsufficientStock { product_id } => json_error(
            StatusCode::CONFLICT,
            "insufficient_stock",
            format!("not enough stock for product {product_id}"),
        ),
        PurchaseError::StoreUnavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
    }
}
