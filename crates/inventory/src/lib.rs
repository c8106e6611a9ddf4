//! Inventory domain module.
//!
//! This crate contains business rules for per-warehouse stock, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod pricing;
pub mod record;

pub use pricing::{final_unit_price, line_total};
pub use record::InventoryRecord;
