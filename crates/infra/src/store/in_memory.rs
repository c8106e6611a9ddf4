//! In-memory store implementations.
//!
//! Intended for tests/dev. Not optimized for performance. Atomicity comes
//! from holding the write lock across each whole check-and-mutate.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;

use stockyard_analytics::{SalesRecord, WarehouseRevenue};
use stockyard_catalog::{Product, ProductPatch, Warehouse};
use stockyard_core::{ProductId, WarehouseId};
use stockyard_inventory::InventoryRecord;

use super::{AnalyticsStore, InventoryStore, ProductStore, StoreError, WarehouseStore};

fn poisoned() -> StoreError {
    StoreError::unavailable("lock poisoned")
}

/// In-memory inventory store keyed by `(product_id, warehouse_id)`.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    records: RwLock<HashMap<(ProductId, WarehouseId), InventoryRecord>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn get(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<InventoryRecord, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        records
            .get(&(product_id, warehouse_id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn try_decrement(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<InventoryRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .get_mut(&(product_id, warehouse_id))
            .ok_or(StoreError::NotFound)?;
        if record.quantity < amount {
            return Err(StoreError::InsufficientStock);
        }
        record.quantity -= amount;
        Ok(record.clone())
    }

    async fn increment(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let record = records
            .get_mut(&(product_id, warehouse_id))
            .ok_or(StoreError::NotFound)?;
        record.quantity += amount;
        Ok(())
    }

    async fn set_discount(
        &self,
        product_ids: &[ProductId],
        warehouse_id: WarehouseId,
        percent: Decimal,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let mut updated = 0;
        for product_id in product_ids {
            if let Some(record) = records.get_mut(&(*product_id, warehouse_id)) {
                record.discount_percent = percent;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn upsert(&self, record: InventoryRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records
            .entry((record.product_id, record.warehouse_id))
            .and_modify(|existing| {
                existing.quantity += record.quantity;
                existing.price = record.price;
                existing.discount_percent = record.discount_percent;
            })
            .or_insert(record);
        Ok(())
    }

    async fn delete(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records
            .remove(&(product_id, warehouse_id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut matching: Vec<InventoryRecord> = records
            .values()
            .filter(|r| r.warehouse_id == warehouse_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.product_id);
        Ok(matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

/// In-memory analytics store keyed by `(warehouse_id, product_id)`.
#[derive(Debug, Default)]
pub struct InMemoryAnalyticsStore {
    records: RwLock<HashMap<(WarehouseId, ProductId), SalesRecord>>,
}

impl InMemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryAnalyticsStore {
    async fn record_sale(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        quantity: i64,
        revenue: Decimal,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        match records.get_mut(&(warehouse_id, product_id)) {
            Some(record) => record
                .absorb(quantity, revenue)
                .map_err(|e| StoreError::invalid(e.to_string()))?,
            None => {
                let record = SalesRecord::first_sale(warehouse_id, product_id, quantity, revenue)
                    .map_err(|e| StoreError::invalid(e.to_string()))?;
                records.insert((warehouse_id, product_id), record);
            }
        }
        Ok(())
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<SalesRecord>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut matching: Vec<SalesRecord> = records
            .values()
            .filter(|r| r.warehouse_id == warehouse_id)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.product_id);
        Ok(matching)
    }

    async fn top_warehouses(&self, limit: i64) -> Result<Vec<WarehouseRevenue>, StoreError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut by_warehouse: HashMap<WarehouseId, Decimal> = HashMap::new();
        for record in records.values() {
            *by_warehouse.entry(record.warehouse_id).or_insert(Decimal::ZERO) +=
                record.total_revenue;
        }
        let mut ranking: Vec<WarehouseRevenue> = by_warehouse
            .into_iter()
            .map(|(warehouse_id, total_revenue)| WarehouseRevenue {
                warehouse_id,
                total_revenue,
            })
            .collect();
        // Descending by revenue; warehouse id breaks ties deterministically.
        ranking.sort_by(|a, b| {
            b.total_revenue
                .cmp(&a.total_revenue)
                .then(a.warehouse_id.cmp(&b.warehouse_id))
        });
        ranking.truncate(limit.max(0) as usize);
        Ok(ranking)
    }

    async fn delete(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records
            .remove(&(warehouse_id, product_id))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

/// In-memory warehouse master-data store.
#[derive(Debug, Default)]
pub struct InMemoryWarehouseStore {
    warehouses: RwLock<HashMap<WarehouseId, Warehouse>>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn create(&self, warehouse: Warehouse) -> Result<(), StoreError> {
        let mut warehouses = self.warehouses.write().map_err(|_| poisoned())?;
        warehouses.insert(warehouse.id, warehouse);
        Ok(())
    }

    async fn get(&self, id: WarehouseId) -> Result<Warehouse, StoreError> {
        let warehouses = self.warehouses.read().map_err(|_| poisoned())?;
        warehouses.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> Result<Vec<Warehouse>, StoreError> {
        let warehouses = self.warehouses.read().map_err(|_| poisoned())?;
        let mut all: Vec<Warehouse> = warehouses.values().cloned().collect();
        all.sort_by_key(|w| w.id);
        Ok(all)
    }

    async fn update_address(&self, id: WarehouseId, address: String) -> Result<(), StoreError> {
        let mut warehouses = self.warehouses.write().map_err(|_| poisoned())?;
        let warehouse = warehouses.get_mut(&id).ok_or(StoreError::NotFound)?;
        warehouse.address = address;
        Ok(())
    }

    async fn delete(&self, id: WarehouseId) -> Result<(), StoreError> {
        let mut warehouses = self.warehouses.write().map_err(|_| poisoned())?;
        warehouses.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

/// In-memory product master-data store.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn create(&self, product: Product) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        products.insert(product.id, product);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        let product = products.get_mut(&id).ok_or(StoreError::NotFound)?;
        patch.apply(product);
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        products.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
