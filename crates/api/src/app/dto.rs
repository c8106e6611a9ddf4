use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateWarehouseRequest {
    pub name: String,
    pub address: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWarehouseRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub weight: Decimal,
    #[serde(default)]
    pub barcode: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertInventoryRequest {
    pub product_id: Uuid,
    pub warehouse_id: Uuid,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ReplenishRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetDiscountRequest {
    pub product_ids: Vec<Uuid>,
    pub discount: Decimal,
}

/// Body of purchase/calculate calls: requested quantity per product.
#[derive(Debug, Deserialize)]
pub struct ItemsRequest {
    pub items: HashMap<Uuid, i64>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub limit: Option<i64>,
}

pub const DEFAULT_PAGE_LIMIT: i64 = 50;
pub const DEFAULT_TOP_LIMIT: i64 = 10;
