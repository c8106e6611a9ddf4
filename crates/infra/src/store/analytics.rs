use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use stockyard_analytics::{SalesRecord, WarehouseRevenue};
use stockyard_core::{ProductId, WarehouseId};

use super::StoreError;

/// Durable mapping from `(warehouse_id, product_id)` to accumulated sales.
///
/// `record_sale` must be an atomic additive upsert: two concurrent sales of
/// the same product both land, neither overwrites the other.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Fold one sale into the pair's running totals (creating the record on
    /// first sale).
    async fn record_sale(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        quantity: i64,
        revenue: Decimal,
    ) -> Result<(), StoreError>;

    /// All sales records for one warehouse, ordered by product id.
    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<SalesRecord>, StoreError>;

    /// Warehouses ranked by summed revenue, descending.
    async fn top_warehouses(&self, limit: i64) -> Result<Vec<WarehouseRevenue>, StoreError>;

    /// Remove the pair's record entirely.
    async fn delete(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> AnalyticsStore for Arc<S>
where
    S: AnalyticsStore + ?Sized,
{
    async fn record_sale(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        quantity: i64,
        revenue: Decimal,
    ) -> Result<(), StoreError> {
        (**self).record_sale(warehouse_id, product_id, quantity, revenue).await
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<SalesRecord>, StoreError> {
        (**self).list_by_warehouse(warehouse_id).await
    }

    async fn top_warehouses(&self, limit: i64) -> Result<Vec<WarehouseRevenue>, StoreError> {
        (**self).top_warehouses(limit).await
    }

    async fn delete(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
    ) -> Result<(), StoreError> {
        (**self).delete(warehouse_id, product_id).await
    }
}
