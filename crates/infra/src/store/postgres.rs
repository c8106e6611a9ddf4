//! Postgres-backed store implementations.
//!
//! All stores share one `sqlx` connection pool. Atomicity of the
//! stock-critical operations is pushed into single SQL statements:
//!
//! - `try_decrement` is one conditional `UPDATE ... AND quantity >= $n`,
//!   so the check and the subtract cannot be interleaved by a concurrent
//!   purchase of the same pair;
//! - `upsert`/`record_sale` are `INSERT ... ON CONFLICT ... DO UPDATE`
//!   statements, so concurrent writers both land.
//!
//! ## Error Mapping
//!
//! | SQLx outcome | StoreError | Scenario |
//! |--------------|------------|----------|
//! | `RowNotFound` | `NotFound` | Addressed pair/row does not exist |
//! | Row decode failure | `Invalid` | Unexpected column shape |
//! | Anything else | `Unavailable` | Connection/pool/IO failure |
//!
//! The conditional decrement distinguishes "no such record" from "not
//! enough stock" with a follow-up existence probe, by variant rather than by
//! inspecting error message text.

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use async_trait::async_trait;

use stockyard_analytics::{SalesRecord, WarehouseRevenue};
use stockyard_catalog::{Product, ProductPatch, Warehouse};
use stockyard_core::{ProductId, WarehouseId};
use stockyard_inventory::InventoryRecord;

use super::{AnalyticsStore, InventoryStore, ProductStore, StoreError, WarehouseStore};

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::invalid(format!("{operation}: row decode failed: {err}"))
        }
        other => StoreError::unavailable(format!("{operation}: {other}")),
    }
}

fn inventory_from_row(row: &sqlx::postgres::PgRow) -> Result<InventoryRecord, sqlx::Error> {
    Ok(InventoryRecord {
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        warehouse_id: WarehouseId::from_uuid(row.try_get("warehouse_id")?),
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
        discount_percent: row.try_get("discount")?,
    })
}

/// Postgres inventory store.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn get(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<InventoryRecord, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT product_id, warehouse_id, quantity, price, discount
            FROM inventory
            WHERE product_id = $1 AND warehouse_id = $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(warehouse_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory.get", e))?
        .ok_or(StoreError::NotFound)?;

        inventory_from_row(&row).map_err(|e| map_sqlx_error("inventory.get", e))
    }

    async fn try_decrement(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<InventoryRecord, StoreError> {
        // Single conditional statement: the quantity check and the subtract
        // happen under the row lock, so no caller can observe an
        // intermediate state.
        let row = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity - $3
            WHERE product_id = $1 AND warehouse_id = $2 AND quantity >= $3
            RETURNING product_id, warehouse_id, quantity, price, discount
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(warehouse_id.as_uuid())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory.try_decrement", e))?;

        match row {
            Some(row) => {
                inventory_from_row(&row).map_err(|e| map_sqlx_error("inventory.try_decrement", e))
            }
            None => {
                // Zero rows updated: either the pair is unknown or the stock
                // is short. Probe existence to report the right variant.
                let exists: bool = sqlx::query_scalar(
                    r#"
                    SELECT EXISTS(
                        SELECT 1 FROM inventory
                        WHERE product_id = $1 AND warehouse_id = $2
                    )
                    "#,
                )
                .bind(product_id.as_uuid())
                .bind(warehouse_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("inventory.try_decrement", e))?;

                if exists {
                    Err(StoreError::InsufficientStock)
                } else {
                    Err(StoreError::NotFound)
                }
            }
        }
    }

    async fn increment(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        amount: i64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity + $3
            WHERE product_id = $1 AND warehouse_id = $2
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(warehouse_id.as_uuid())
        .bind(amount)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory.increment", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_discount(
        &self,
        product_ids: &[ProductId],
        warehouse_id: WarehouseId,
        percent: Decimal,
    ) -> Result<u64, StoreError> {
        let ids: Vec<uuid::Uuid> = product_ids.iter().map(|p| *p.as_uuid()).collect();
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET discount = $1
            WHERE product_id = ANY($2) AND warehouse_id = $3
            "#,
        )
        .bind(percent)
        .bind(&ids)
        .bind(warehouse_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory.set_discount", e))?;

        Ok(result.rows_affected())
    }

    async fn upsert(&self, record: InventoryRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, warehouse_id, quantity, price, discount)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (product_id, warehouse_id)
            DO UPDATE SET
                quantity = inventory.quantity + EXCLUDED.quantity,
                price = EXCLUDED.price,
                discount = EXCLUDED.discount
            "#,
        )
        .bind(record.product_id.as_uuid())
        .bind(record.warehouse_id.as_uuid())
        .bind(record.quantity)
        .bind(record.price)
        .bind(record.discount_percent)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory.upsert", e))?;

        Ok(())
    }

    async fn delete(
        &self,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM inventory WHERE product_id = $1 AND warehouse_id = $2",
        )
        .bind(product_id.as_uuid())
        .bind(warehouse_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory.delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, warehouse_id, quantity, price, discount
            FROM inventory
            WHERE warehouse_id = $1
            ORDER BY product_id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(warehouse_id.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("inventory.list_by_warehouse", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(
                inventory_from_row(&row)
                    .map_err(|e| map_sqlx_error("inventory.list_by_warehouse", e))?,
            );
        }
        Ok(records)
    }
}

/// Postgres analytics store.
#[derive(Debug, Clone)]
pub struct PostgresAnalyticsStore {
    pool: PgPool,
}

impl PostgresAnalyticsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsStore for PostgresAnalyticsStore {
    async fn record_sale(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        quantity: i64,
        revenue: Decimal,
    ) -> Result<(), StoreError> {
        tracing::debug!(%warehouse_id, %product_id, quantity, %revenue, "recording sale");

        sqlx::query(
            r#"
            INSERT INTO sales (warehouse_id, product_id, sold_quantity, total_revenue)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (warehouse_id, product_id)
            DO UPDATE SET
                sold_quantity = sales.sold_quantity + EXCLUDED.sold_quantity,
                total_revenue = sales.total_revenue + EXCLUDED.total_revenue
            "#,
        )
        .bind(warehouse_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity)
        .bind(revenue)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("analytics.record_sale", e))?;

        Ok(())
    }

    async fn list_by_warehouse(
        &self,
        warehouse_id: WarehouseId,
    ) -> Result<Vec<SalesRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT warehouse_id, product_id, sold_quantity, total_revenue
            FROM sales
            WHERE warehouse_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(warehouse_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("analytics.list_by_warehouse", e))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(SalesRecord {
                warehouse_id: WarehouseId::from_uuid(
                    row.try_get("warehouse_id")
                        .map_err(|e| map_sqlx_error("analytics.list_by_warehouse", e))?,
                ),
                product_id: ProductId::from_uuid(
                    row.try_get("product_id")
                        .map_err(|e| map_sqlx_error("analytics.list_by_warehouse", e))?,
                ),
                sold_quantity: row
                    .try_get("sold_quantity")
                    .map_err(|e| map_sqlx_error("analytics.list_by_warehouse", e))?,
                total_revenue: row
                    .try_get("total_revenue")
                    .map_err(|e| map_sqlx_error("analytics.list_by_warehouse", e))?,
            });
        }
        Ok(records)
    }

    async fn top_warehouses(&self, limit: i64) -> Result<Vec<WarehouseRevenue>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT warehouse_id, COALESCE(SUM(total_revenue), 0) AS total_revenue
            FROM sales
            GROUP BY warehouse_id
            ORDER BY total_revenue DESC, warehouse_id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("analytics.top_warehouses", e))?;

        let mut ranking = Vec::with_capacity(rows.len());
        for row in rows {
            ranking.push(WarehouseRevenue {
                warehouse_id: WarehouseId::from_uuid(
                    row.try_get("warehouse_id")
                        .map_err(|e| map_sqlx_error("analytics.top_warehouses", e))?,
                ),
                total_revenue: row
                    .try_get("total_revenue")
                    .map_err(|e| map_sqlx_error("analytics.top_warehouses", e))?,
            });
        }
        Ok(ranking)
    }

    async fn delete(
        &self,
        warehouse_id: WarehouseId,
        product_id: ProductId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "DELETE FROM sales WHERE warehouse_id = $1 AND product_id = $2",
        )
        .bind(warehouse_id.as_uuid())
        .bind(product_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("analytics.delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Postgres warehouse master-data store.
#[derive(Debug, Clone)]
pub struct PostgresWarehouseStore {
    pool: PgPool,
}

impl PostgresWarehouseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn warehouse_from_row(row: &sqlx::postgres::PgRow) -> Result<Warehouse, sqlx::Error> {
    Ok(Warehouse {
        id: WarehouseId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        address: row.try_get("address")?,
        description: row.try_get("description")?,
    })
}

#[async_trait]
impl WarehouseStore for PostgresWarehouseStore {
    async fn create(&self, warehouse: Warehouse) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO warehouses (id, name, address, description) VALUES ($1, $2, $3, $4)",
        )
        .bind(warehouse.id.as_uuid())
        .bind(&warehouse.name)
        .bind(&warehouse.address)
        .bind(&warehouse.description)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("warehouses.create", e))?;

        Ok(())
    }

    async fn get(&self, id: WarehouseId) -> Result<Warehouse, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, address, description FROM warehouses WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("warehouses.get", e))?
        .ok_or(StoreError::NotFound)?;

        warehouse_from_row(&row).map_err(|e| map_sqlx_error("warehouses.get", e))
    }

    async fn list(&self) -> Result<Vec<Warehouse>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, address, description FROM warehouses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("warehouses.list", e))?;

        let mut warehouses = Vec::with_capacity(rows.len());
        for row in rows {
            warehouses
                .push(warehouse_from_row(&row).map_err(|e| map_sqlx_error("warehouses.list", e))?);
        }
        Ok(warehouses)
    }

    async fn update_address(&self, id: WarehouseId, address: String) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE warehouses SET address = $1 WHERE id = $2")
            .bind(&address)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("warehouses.update_address", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: WarehouseId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("warehouses.delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// Postgres product master-data store.
#[derive(Debug, Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &sqlx::postgres::PgRow) -> Result<Product, StoreError> {
    let attributes: serde_json::Value = row
        .try_get("attributes")
        .map_err(|e| map_sqlx_error("products.row", e))?;
    let attributes = serde_json::from_value(attributes)
        .map_err(|e| StoreError::invalid(format!("products.row: bad attributes: {e}")))?;

    Ok(Product {
        id: ProductId::from_uuid(
            row.try_get("id").map_err(|e| map_sqlx_error("products.row", e))?,
        ),
        name: row.try_get("name").map_err(|e| map_sqlx_error("products.row", e))?,
        description: row
            .try_get("description")
            .map_err(|e| map_sqlx_error("products.row", e))?,
        attributes,
        weight: row.try_get("weight").map_err(|e| map_sqlx_error("products.row", e))?,
        barcode: row.try_get("barcode").map_err(|e| map_sqlx_error("products.row", e))?,
    })
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn create(&self, product: Product) -> Result<(), StoreError> {
        let attributes = serde_json::to_value(&product.attributes)
            .map_err(|e| StoreError::invalid(format!("products.create: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, attributes, weight, barcode)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(attributes)
        .bind(product.weight)
        .bind(&product.barcode)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.create", e))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, description, attributes, weight, barcode FROM products ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.list", e))?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            products.push(product_from_row(&row)?);
        }
        Ok(products)
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> Result<(), StoreError> {
        let attributes = patch
            .attributes
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::invalid(format!("products.update: {e}")))?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                attributes = COALESCE($3, attributes),
                weight = COALESCE($4, weight),
                barcode = COALESCE($5, barcode)
            WHERE id = $6
            "#,
        )
        .bind(patch.name)
        .bind(patch.description)
        .bind(attributes)
        .bind(patch.weight)
        .bind(patch.barcode)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products.update", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("products.delete", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
