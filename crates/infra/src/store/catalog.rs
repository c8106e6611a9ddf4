use std::sync::Arc;

use async_trait::async_trait;

use stockyard_catalog::{Product, ProductPatch, Warehouse};
use stockyard_core::{ProductId, WarehouseId};

use super::StoreError;

/// Warehouse master-data storage.
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn create(&self, warehouse: Warehouse) -> Result<(), StoreError>;

    async fn get(&self, id: WarehouseId) -> Result<Warehouse, StoreError>;

    async fn list(&self) -> Result<Vec<Warehouse>, StoreError>;

    /// Update a warehouse's address; `NotFound` when the id is unknown.
    async fn update_address(&self, id: WarehouseId, address: String) -> Result<(), StoreError>;

    async fn delete(&self, id: WarehouseId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> WarehouseStore for Arc<S>
where
    S: WarehouseStore + ?Sized,
{
    async fn create(&self, warehouse: Warehouse) -> Result<(), StoreError> {
        (**self).create(warehouse).await
    }

    async fn get(&self, id: WarehouseId) -> Result<Warehouse, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Warehouse>, StoreError> {
        (**self).list().await
    }

    async fn update_address(&self, id: WarehouseId, address: String) -> Result<(), StoreError> {
        (**self).update_address(id, address).await
    }

    async fn delete(&self, id: WarehouseId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

/// Product master-data storage.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: Product) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Apply a partial update; `NotFound` when the id is unknown.
    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<(), StoreError>;

    async fn delete(&self, id: ProductId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn create(&self, product: Product) -> Result<(), StoreError> {
        (**self).create(product).await
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list().await
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<(), StoreError> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}
