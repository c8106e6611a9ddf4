use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, WarehouseId};

/// Warehouse master data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub address: String,
    pub description: Option<String>,
}

impl Warehouse {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let address = address.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if address.trim().is_empty() {
            return Err(DomainError::validation("address cannot be empty"));
        }
        Ok(Self {
            id: WarehouseId::new(),
            name,
            address,
            description,
        })
    }
}
