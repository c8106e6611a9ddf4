//! Warehouse and product master data.
//!
//! Plumbing around the purchase engine: plain validated records, no
//! lifecycle beyond create/update/delete.

pub mod product;
pub mod warehouse;

pub use product::{Product, ProductPatch};
pub use warehouse::Warehouse;
