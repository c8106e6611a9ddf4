//! `stockyard-infra` — storage contracts, their implementations, and the
//! purchase engine that orchestrates them.
//!
//! Layout:
//! - `store/`: storage traits consumed by the engine and the HTTP layer,
//!   plus the in-memory (tests/dev) and Postgres (production) backends
//! - `purchase`: the two-phase purchase transaction processor
//! - `retry`: bounded backoff for idempotent reads

pub mod purchase;
pub mod retry;
pub mod store;

pub use purchase::{PurchaseError, PurchaseLine, PurchaseProcessor, Receipt};
pub use store::{
    AnalyticsStore, InMemoryAnalyticsStore, InMemoryInventoryStore, InMemoryProductStore,
    InMemoryWarehouseStore, InventoryStore, ProductStore, StoreError, WarehouseStore,
};
