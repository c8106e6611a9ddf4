use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, ProductId, WarehouseId};

/// Accumulated sales for one product in one warehouse.
///
/// Identity is the `(warehouse_id, product_id)` pair. Both counters are
/// monotonically non-decreasing: a record is only ever created by a first
/// sale and grown by further sales, never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub sold_quantity: i64,
    pub total_revenue: Decimal,
}

impl SalesRecord {
    /// Record created lazily by the first sale of a pair.
    pub fn first_sale(
        warehouse_id: WarehouseId,
        product_id: ProductId,
        quantity: i64,
        revenue: Decimal,
    ) -> DomainResult<Self> {
        validate_sale(quantity, revenue)?;
        Ok(Self {
            warehouse_id,
            product_id,
            sold_quantity: quantity,
            total_revenue: revenue,
        })
    }

    /// Fold one more sale into the running totals (additive upsert's update
    /// path).
    pub fn absorb(&mut self, quantity: i64, revenue: Decimal) -> DomainResult<()> {
        validate_sale(quantity, revenue)?;
        self.sold_quantity += quantity;
        self.total_revenue += revenue;
        Ok(())
    }
}

fn validate_sale(quantity: i64, revenue: Decimal) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("sold quantity must be positive"));
    }
    if revenue < Decimal::ZERO {
        return Err(DomainError::validation("revenue cannot be negative"));
    }
    Ok(())
}

/// One row of the revenue ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseRevenue {
    pub warehouse_id: WarehouseId,
    pub total_revenue: Decimal,
}
