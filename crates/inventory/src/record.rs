use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, ProductId, WarehouseId};

/// Stock entry for one product in one warehouse.
///
/// Identity is the `(product_id, warehouse_id)` pair. `quantity` must never
/// be negative; `discount_percent` is a percentage in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub price: Decimal,
    pub discount_percent: Decimal,
}

impl InventoryRecord {
    /// Build a validated record for initial stocking.
    pub fn new(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
        price: Decimal,
        discount_percent: Decimal,
    ) -> DomainResult<Self> {
        let record = Self {
            product_id,
            warehouse_id,
            quantity,
            price,
            discount_percent,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check all field-level invariants.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::invariant("quantity cannot be negative"));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }
        validate_discount(self.discount_percent)
    }
}

/// Validate a discount percentage in isolation (also used for bulk discount
/// updates, where no full record is at hand).
pub fn validate_discount(percent: Decimal) -> DomainResult<()> {
    if percent < Decimal::ZERO || percent > Decimal::from(100) {
        return Err(DomainError::validation(
            "discount_percent must be between 0 and 100",
        ));
    }
    Ok(())
}
