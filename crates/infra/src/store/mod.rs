//! Storage contracts and their implementations.
//!
//! Each trait is the capability the rest of the system is written against;
//! `in_memory` provides the test/dev backend, `postgres` the production one.
//! Implementations must make `try_decrement`/`increment`/`record_sale`
//! atomic per key; the engine's concurrency story rests on that.

use thiserror::Error;

pub mod analytics;
pub mod catalog;
pub mod in_memory;
pub mod inventory;
pub mod postgres;

pub use analytics::AnalyticsStore;
pub use catalog::{ProductStore, WarehouseStore};
pub use in_memory::{
    InMemoryAnalyticsStore, InMemoryInventoryStore, InMemoryProductStore, InMemoryWarehouseStore,
};
pub use inventory::InventoryStore;
pub use postgres::{
    PostgresAnalyticsStore, PostgresInventoryStore, PostgresProductStore, PostgresWarehouseStore,
};

/// Storage operation error.
///
/// Variants are matched by kind, never by message text: the difference
/// between "no such record" and "not enough stock" is load-bearing for the
/// purchase engine's rollback decisions.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,

    /// A conditional decrement found less stock than requested.
    #[error("insufficient stock")]
    InsufficientStock,

    /// The operation carried data the store cannot accept (bad row shape,
    /// domain-invalid values reaching the storage boundary).
    #[error("invalid store operation: {0}")]
    Invalid(String),

    /// The backend is unreachable or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    /// Only transient availability failures are safe to retry, and even then
    /// only for idempotent reads.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
