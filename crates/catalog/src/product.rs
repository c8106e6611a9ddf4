use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, ProductId};

/// Product master data.
///
/// Pricing lives on the inventory record (per warehouse), not here:
/// the same product can carry different prices in different warehouses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    pub weight: Decimal,
    #[serde(default)]
    pub barcode: String,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        attributes: HashMap<String, String>,
        weight: Decimal,
        barcode: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if weight < Decimal::ZERO {
            return Err(DomainError::validation("weight cannot be negative"));
        }
        Ok(Self {
            id: ProductId::new(),
            name,
            description: description.into(),
            attributes,
            weight,
            barcode: barcode.into(),
        })
    }
}

/// Partial update for a product; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub attributes: Option<HashMap<String, String>>,
    pub weight: Option<Decimal>,
    pub barcode: Option<String>,
}

impl ProductPatch {
    /// Field-level checks; callers validate before handing the patch to a
    /// store.
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(weight) = self.weight {
            if weight < Decimal::ZERO {
                return Err(DomainError::validation("weight cannot be negative"));
            }
        }
        Ok(())
    }

    /// Overlay the provided fields onto `product`. Assumes `validate` has
    /// passed.
    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(attributes) = &self.attributes {
            product.attributes = attributes.clone();
        }
        if let Some(weight) = self.weight {
            product.weight = weight;
        }
        if let Some(barcode) = &self.barcode {
            product.barcode = barcode.clone();
        }
    }
}
