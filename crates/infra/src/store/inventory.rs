use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use stockyard_core::{ProductId, WarehouseId};
use stockyard_inventory::InventoryRecord;

use super::StoreError;

/// Durable mapping from `(product_id, warehouse_id)` to a stock record.
///
/// ## Atomicity requirements
///
/// `try_decrement` must be a single atomic check-and-subtract per key: two
/// concurrent purchases of the same product serialize at that key and
/// neither can push `quantity` below zero. `increment` (replenishment and
/// rollback) must be atomic per key as well. Operations on disjoint keys may
/// proceed in parallel.
///
/// ## Upsert semantics
///
/// `upsert` is the initial-stocking operation: for a new pair it inserts the
/// record; for an existing pair it adds to the quantity and replaces
/// price/discount (re-stocking with a new price).
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Fetch one record; `StoreError::NotFound` when the pair is unknown.
    async fn get(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<InventoryRecord, StoreError>;

    /// Subtract `amount` only if `quantity >= amount`, atomically.
    ///
    /// Returns the record **as of the decrement**: the purchase engine
    /// prices lines from this snapshot and never re-reads, so a concurrent
    /// discount change cannot skew an in-flight purchase.
    async fn try_decrement(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<InventoryRecord, StoreError>;

    /// Add `amount` to the pair's stock, atomically. Used for replenishment
    /// and for compensating rollback.
    async fn increment(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<(), StoreError>;

    /// Set the discount on a batch of products in one warehouse. Returns the
    /// number of records actually updated.
    async fn set_discount(
        &self,
        product_ids: &[ProductId],
        warehouse_id: WarehouseId,
        percent: Decimal,
    ) -> Result<u64, StoreError>;

    /// Initial stocking: insert, or add-quantity/replace-price for an
    /// existing pair.
    async fn upsert(&self, record: InventoryRecord) -> Result<(), StoreError>;

    /// Remove the pair's record entirely.
    async fn delete(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<(), StoreError>;

    /// Paginated listing of one warehouse's stock, ordered by product id.
    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InventoryRecord>, StoreError>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn get(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<InventoryRecord, StoreError> {
        (**self).get(product_id, warehouse_id).await
    }

    async fn try_decrement(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<InventoryRecord, StoreError> {
        (**self).try_decrement(product_id, warehouse_id, amount).await
    }

    async fn increment(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<(), StoreError> {
        (**self).increment(product_id, warehouse_id, amount).await
    }

    async fn set_discount(
        &self,
        product_ids: &[ProductId],
        warehouse_id: WarehouseId,
        percent: Decimal,
    ) -> Result<u64, StoreError> {
        (**self).set_discount(product_ids, warehouse_id, percent).await
    }

    async fn upsert(&self, record: InventoryRecord) -> Result<(), StoreError> {
        (**self).upsert(record).await
    }

    async fn delete(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<(), StoreError> {
        (**self).delete(product_id, warehouse_id).await
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        (**self).list_by_warehouse(warehouse_id, limit, offset).await
    }
}
