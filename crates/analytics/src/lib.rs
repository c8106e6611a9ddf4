//! Sales analytics domain module.
//!
//! Pure aggregation rules for recorded sales; no IO, no storage.

pub mod record;

pub use record::{SalesRecord, WarehouseRevenue};
