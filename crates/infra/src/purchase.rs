//! Purchase transaction processor.
//!
//! Orchestrates a multi-line purchase against the inventory and analytics
//! stores. The processor owns no persistent state; it runs one request at a
//! time against whatever stores it was built with.
//!
//! ## Two phases, all or nothing
//!
//! 1. **Validate and reserve**: every line is applied as one atomic
//!    conditional decrement. The first failure (missing record, short stock,
//!    store outage, timeout) rolls back every decrement already applied in
//!    this call and aborts; a failed purchase leaves no record partially
//!    decremented.
//! 2. **Settlement**: line prices come from the record snapshots captured at
//!    decrement time (never re-read, so a concurrent discount change cannot
//!    skew an in-flight purchase), and sales land in the analytics store as
//!    additive upserts issued concurrently across lines.
//!
//! Settlement is best-effort: once stock is committed as sold, an analytics
//! failure does not reverse the decrement and does not stop other lines'
//! recordings. Failures are logged and surfaced on the receipt as a
//! partial-success report instead.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use stockyard_core::{ProductId, WarehouseId};
use stockyard_inventory::{pricing, InventoryRecord};

use crate::retry::{self, Backoff};
use crate::store::{AnalyticsStore, InventoryStore, StoreError};

/// One requested line of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// One settled line of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReceiptLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price_charged: Decimal,
    pub line_total: Decimal,
}

/// A line whose analytics recording failed after the stock was sold.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AnalyticsFailure {
    pub product_id: ProductId,
    pub reason: String,
}

/// Itemized result of a successful purchase.
///
/// `analytics_failures` is normally empty; a non-empty list means the stock
/// mutation succeeded but some lines' sales never reached the analytics
/// store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Receipt {
    pub warehouse_id: WarehouseId,
    pub lines: Vec<ReceiptLine>,
    pub grand_total: Decimal,
    pub completed_at: DateTime<Utc>,
    pub analytics_failures: Vec<AnalyticsFailure>,
}

/// Terminal purchase failure. None of these leave a partial decrement
/// behind.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("invalid purchase request: {0}")]
    InvalidInput(String),

    #[error("product {product_id} is not stocked in this warehouse")]
    NotFound { product_id: ProductId },

    #[error("not enough stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    #[error("storage unavailable: {0}")]
    StoreUnavailable(String),
}

impl PurchaseError {
    fn from_store(product_id: ProductId, err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound { product_id },
            StoreError::InsufficientStock => Self::InsufficientStock { product_id },
            StoreError::Invalid(msg) | StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
        }
    }
}

/// The purchase engine. Generic over its store capabilities so the same
/// logic runs against the in-memory backend in tests and Postgres in
/// production.
#[derive(Debug, Clone)]
pub struct PurchaseProcessor<I, A> {
    inventory: I,
    analytics: A,
    op_timeout: Duration,
    read_backoff: Backoff,
}

impl<I, A> PurchaseProcessor<I, A>
where
    I: InventoryStore,
    A: AnalyticsStore + Clone + 'static,
{
    pub fn new(inventory: I, analytics: A) -> Self {
        Self {
            inventory,
            analytics,
            op_timeout: Duration::from_secs(5),
            read_backoff: Backoff::default(),
        }
    }

    /// Cap on any single store call. A call exceeding this is treated as a
    /// store outage; during phase 1 that triggers the same compensating
    /// rollback as an insufficient-stock failure.
    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }

    pub fn with_read_backoff(mut self, read_backoff: Backoff) -> Self {
        self.read_backoff = read_backoff;
        self
    }

    /// Execute a multi-line purchase: decrement stock for every line or for
    /// none, then record the sales.
    pub async fn purchase(
        &self,
        warehouse_id: WarehouseId,
        lines: Vec<PurchaseLine>,
    ) -> Result<Receipt, PurchaseError> {
        let lines = normalize(lines)?;

        // Phase 1: validate and reserve.
        let mut reserved: Vec<(i64, InventoryRecord)> = Vec::with_capacity(lines.len());
        for line in &lines {
            let attempt = self
                .bounded(self.inventory.try_decrement(
                    line.product_id,
                    warehouse_id,
                    line.quantity,
                ))
                .await;

            match attempt {
                Ok(snapshot) => reserved.push((line.quantity, snapshot)),
                Err(err) => {
                    tracing::warn!(
                        product_id = %line.product_id,
                        %warehouse_id,
                        %err,
                        "purchase aborted; rolling back reserved lines"
                    );
                    self.roll_back(warehouse_id, &reserved).await;
                    return Err(PurchaseError::from_store(line.product_id, err));
                }
            }
        }

        // Price every line from its decrement-time snapshot. Stored records
        // are validated on the way in, so a pricing failure here means the
        // store handed back corrupt data; the stock is still restorable at
        // this point, so treat it like an outage and roll back.
        let mut receipt_lines = Vec::with_capacity(reserved.len());
        let mut grand_total = Decimal::ZERO;
        for (quantity, snapshot) in &reserved {
            let unit_price_charged =
                match pricing::final_unit_price(snapshot.price, snapshot.discount_percent) {
                    Ok(price) => price,
                    Err(err) => {
                        self.roll_back(warehouse_id, &reserved).await;
                        return Err(PurchaseError::StoreUnavailable(format!(
                            "corrupt inventory record for product {}: {err}",
                            snapshot.product_id
                        )));
                    }
                };
            let line_total = pricing::line_total(*quantity, unit_price_charged);
            grand_total += line_total;
            receipt_lines.push(ReceiptLine {
                product_id: snapshot.product_id,
                quantity: *quantity,
                unit_price_charged,
                line_total,
            });
        }

        // Phase 2: settlement. Lines touch independent (warehouse, product)
        // keys, so the upserts go out concurrently.
        let analytics_failures = self.record_sales(warehouse_id, &receipt_lines).await;

        Ok(Receipt {
            warehouse_id,
            lines: receipt_lines,
            grand_total,
            completed_at: Utc::now(),
            analytics_failures,
        })
    }

    /// Price a prospective purchase without mutating anything.
    pub async fn quote(
        &self,
        warehouse_id: WarehouseId,
        lines: Vec<PurchaseLine>,
    ) -> Result<Decimal, PurchaseError> {
        let lines = normalize(lines)?;

        let mut total = Decimal::ZERO;
        for line in &lines {
            // Reads are idempotent, so transient store failures get the
            // bounded-backoff treatment.
            let record = retry::with_backoff(self.read_backoff, || {
                self.bounded(self.inventory.get(line.product_id, warehouse_id))
            })
            .await
            .map_err(|err| PurchaseError::from_store(line.product_id, err))?;

            let unit_price = pricing::final_unit_price(record.price, record.discount_percent)
                .map_err(|err| {
                    PurchaseError::StoreUnavailable(format!(
                        "corrupt inventory record for product {}: {err}",
                        line.product_id
                    ))
                })?;
            total += pricing::line_total(line.quantity, unit_price);
        }
        Ok(total)
    }

    async fn record_sales(
        &self,
        warehouse_id: WarehouseId,
        lines: &[ReceiptLine],
    ) -> Vec<AnalyticsFailure> {
        let mut tasks = tokio::task::JoinSet::new();
        for line in lines {
            let analytics = self.analytics.clone();
            let op_timeout = self.op_timeout;
            let product_id = line.product_id;
            let quantity = line.quantity;
            let revenue = line.line_total;
            tasks.spawn(async move {
                let result = match tokio::time::timeout(
                    op_timeout,
                    analytics.record_sale(warehouse_id, product_id, quantity, revenue),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::unavailable("analytics call timed out")),
                };
                (product_id, result)
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((product_id, Err(err))) => {
                    tracing::error!(
                        %product_id,
                        %warehouse_id,
                        %err,
                        "sale recorded against stock but analytics update failed"
                    );
                    failures.push(AnalyticsFailure {
                        product_id,
                        reason: err.to_string(),
                    });
                }
                Err(join_err) => {
                    tracing::error!(%warehouse_id, %join_err, "analytics task failed to complete");
                }
            }
        }
        failures.sort_by_key(|f| f.product_id);
        failures
    }

    /// Compensate every decrement applied so far in this call, newest first.
    async fn roll_back(&self, warehouse_id: WarehouseId, reserved: &[(i64, InventoryRecord)]) {
        for (quantity, snapshot) in reserved.iter().rev() {
            let restore = self
                .bounded(self.inventory.increment(
                    snapshot.product_id,
                    warehouse_id,
                    *quantity,
                ))
                .await;
            if let Err(err) = restore {
                // Stock is now short by `quantity` until repaired; log
                // everything an operator needs.
                tracing::error!(
                    product_id = %snapshot.product_id,
                    %warehouse_id,
                    quantity,
                    %err,
                    "compensating increment failed; stock requires manual repair"
                );
            }
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::unavailable("store call timed out")),
        }
    }
}

/// Reject malformed requests before any store call, and fix the line order
/// so the "first offending product" of a failure is deterministic.
fn normalize(mut lines: Vec<PurchaseLine>) -> Result<Vec<PurchaseLine>, PurchaseError> {
    if lines.is_empty() {
        return Err(PurchaseError::InvalidInput(
            "purchase must contain at least one line".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in &lines {
        if line.quantity <= 0 {
            return Err(PurchaseError::InvalidInput(format!(
                "quantity for product {} must be positive",
                line.product_id
            )));
        }
        if !seen.insert(line.product_id) {
            return Err(PurchaseError::InvalidInput(format!(
                "product {} appears more than once",
                line.product_id
            )));
        }
    }

    lines.sort_by_key(|line| line.product_id);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::store::{InMemoryAnalyticsStore, InMemoryInventoryStore};

    type Processor = PurchaseProcessor<Arc<InMemoryInventoryStore>, Arc<InMemoryAnalyticsStore>>;

    struct Fixture {
        inventory: Arc<InMemoryInventoryStore>,
        analytics: Arc<InMemoryAnalyticsStore>,
        processor: Processor,
        warehouse_id: WarehouseId,
    }

    fn fixture() -> Fixture {
        let inventory = Arc::new(InMemoryInventoryStore::new());
        let analytics = Arc::new(InMemoryAnalyticsStore::new());
        let processor = PurchaseProcessor::new(inventory.clone(), analytics.clone());
        Fixture {
            inventory,
            analytics,
            processor,
            warehouse_id: WarehouseId::new(),
        }
    }

    async fn stock(
        fx: &Fixture,
        quantity: i64,
        price: i64,
        discount: i64,
    ) -> ProductId {
        let product_id = ProductId::new();
        stock_as(fx, product_id, quantity, price, discount).await;
        product_id
    }

    async fn stock_as(
        fx: &Fixture,
        product_id: ProductId,
        quantity: i64,
        price: i64,
        discount: i64,
    ) {
        fx.inventory
            .upsert(
                InventoryRecord::new(
                    product_id,
                    fx.warehouse_id,
                    quantity,
                    Decimal::new(price, 0),
                    Decimal::new(discount, 0),
                )
                .unwrap(),
            )
            .await
            .unwrap();
    }

    /// Explicit id with a known sort position (ids are ordered by their
    /// underlying uuid bytes).
    fn ordered_product_id(n: u128) -> ProductId {
        ProductId::from_uuid(uuid::Uuid::from_u128(n))
    }

    fn line(product_id: ProductId, quantity: i64) -> PurchaseLine {
        PurchaseLine {
            product_id,
            quantity,
        }
    }

    async fn quantity_of(fx: &Fixture, product_id: ProductId) -> i64 {
        fx.inventory
            .get(product_id, fx.warehouse_id)
            .await
            .unwrap()
            .quantity
    }

    #[tokio::test]
    async fn purchase_decrements_stock_and_records_sale() {
        let fx = fixture();
        let product_id = stock(&fx, 5, 100, 20).await;

        let receipt = fx
            .processor
            .purchase(fx.warehouse_id, vec![line(product_id, 3)])
            .await
            .unwrap();

        assert_eq!(receipt.lines.len(), 1);
        let l = &receipt.lines[0];
        assert_eq!(l.product_id, product_id);
        assert_eq!(l.quantity, 3);
        assert_eq!(l.unit_price_charged, Decimal::new(80, 0));
        assert_eq!(l.line_total, Decimal::new(240, 0));
        assert_eq!(receipt.grand_total, Decimal::new(240, 0));
        assert!(receipt.analytics_failures.is_empty());

        assert_eq!(quantity_of(&fx, product_id).await, 2);

        let sales = fx.analytics.list_by_warehouse(fx.warehouse_id).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].sold_quantity, 3);
        assert_eq!(sales[0].total_revenue, Decimal::new(240, 0));
    }

    #[tokio::test]
    async fn insufficient_stock_changes_nothing() {
        let fx = fixture();
        let product_id = stock(&fx, 2, 100, 20).await;

        let err = fx
            .processor
            .purchase(fx.warehouse_id, vec![line(product_id, 10)])
            .await
            .unwrap_err();

        match err {
            PurchaseError::InsufficientStock { product_id: p } => assert_eq!(p, product_id),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(quantity_of(&fx, product_id).await, 2);
        assert!(fx
            .analytics
            .list_by_warehouse(fx.warehouse_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn unstocked_product_is_not_found() {
        let fx = fixture();
        let ghost = ProductId::new();

        let err = fx
            .processor
            .purchase(fx.warehouse_id, vec![line(ghost, 1)])
            .await
            .unwrap_err();

        match err {
            PurchaseError::NotFound { product_id } => assert_eq!(product_id, ghost),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failing_line_rolls_back_earlier_lines() {
        let fx = fixture();
        // `first` sorts (and reserves) before `second`; the second line is
        // the one that fails.
        let first = ordered_product_id(1);
        let second = ordered_product_id(2);
        stock_as(&fx, first, 5, 100, 0).await;
        stock_as(&fx, second, 1, 50, 0).await;

        let err = fx
            .processor
            .purchase(fx.warehouse_id, vec![line(first, 2), line(second, 3)])
            .await
            .unwrap_err();

        match err {
            PurchaseError::InsufficientStock { product_id } => assert_eq!(product_id, second),
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The first line's decrement was compensated.
        assert_eq!(quantity_of(&fx, first).await, 5);
        assert_eq!(quantity_of(&fx, second).await, 1);
        assert!(fx
            .analytics
            .list_by_warehouse(fx.warehouse_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn multi_line_receipt_sums_grand_total() {
        let fx = fixture();
        let first = ordered_product_id(1);
        let second = ordered_product_id(2);
        stock_as(&fx, first, 10, 100, 10).await;
        stock_as(&fx, second, 10, 50, 0).await;

        let receipt = fx
            .processor
            .purchase(fx.warehouse_id, vec![line(second, 2), line(first, 1)])
            .await
            .unwrap();

        // Lines come back sorted by product id regardless of request order.
        assert_eq!(receipt.lines[0].product_id, first);
        assert_eq!(receipt.lines[0].line_total, Decimal::new(90, 0));
        assert_eq!(receipt.lines[1].product_id, second);
        assert_eq!(receipt.lines[1].line_total, Decimal::new(100, 0));
        assert_eq!(receipt.grand_total, Decimal::new(190, 0));
    }

    #[tokio::test]
    async fn empty_request_is_invalid() {
        let fx = fixture();
        let err = fx
            .processor
            .purchase(fx.warehouse_id, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, PurchaseError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected_before_any_mutation() {
        let fx = fixture();
        let stocked = stock(&fx, 5, 100, 0).await;

        let err = fx
            .processor
            .purchase(
                fx.warehouse_id,
                vec![line(stocked, 2), line(ProductId::new(), 0)],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PurchaseError::InvalidInput(_)));
        assert_eq!(quantity_of(&fx, stocked).await, 5);
    }

    #[tokio::test]
    async fn duplicate_products_are_rejected() {
        let fx = fixture();
        let product_id = stock(&fx, 5, 100, 0).await;

        let err = fx
            .processor
            .purchase(
                fx.warehouse_id,
                vec![line(product_id, 1), line(product_id, 2)],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PurchaseError::InvalidInput(_)));
        assert_eq!(quantity_of(&fx, product_id).await, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_purchases_cannot_oversell() {
        let fx = fixture();
        let product_id = stock(&fx, 5, 100, 0).await;
        let processor = Arc::new(fx.processor.clone());

        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let mut handles = Vec::new();
        for quantity in [3i64, 4i64] {
            let processor = processor.clone();
            let barrier = barrier.clone();
            let warehouse_id = fx.warehouse_id;
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                processor
                    .purchase(warehouse_id, vec![line(product_id, quantity)])
                    .await
                    .map(|receipt| receipt.lines[0].quantity)
            }));
        }

        let mut succeeded = Vec::new();
        let mut failed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(quantity) => succeeded.push(quantity),
                Err(PurchaseError::InsufficientStock { .. }) => failed += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        // 3 + 4 > 5: exactly one side wins.
        assert_eq!(succeeded.len(), 1);
        assert_eq!(failed, 1);
        assert_eq!(quantity_of(&fx, product_id).await, 5 - succeeded[0]);
    }

    /// Analytics store that fails for one product and delegates the rest.
    #[derive(Clone)]
    struct FlakyAnalytics {
        inner: Arc<InMemoryAnalyticsStore>,
        fail_for: ProductId,
    }

    #[async_trait]
    impl AnalyticsStore for FlakyAnalytics {
        async fn record_sale(
            &self,
            warehouse_id: WarehouseId,
            product_id: ProductId,
            quantity: i64,
            revenue: Decimal,
        ) -> Result<(), StoreError> {
            if product_id == self.fail_for {
                return Err(StoreError::unavailable("analytics backend down"));
            }
            self.inner
                .record_sale(warehouse_id, product_id, quantity, revenue)
                .await
        }

        async fn list_by_warehouse(
            &self,
            warehouse_id: WarehouseId,
        ) -> Result<Vec<stockyard_analytics::SalesRecord>, StoreError> {
            self.inner.list_by_warehouse(warehouse_id).await
        }

        async fn top_warehouses(
            &self,
            limit: i64,
        ) -> Result<Vec<stockyard_analytics::WarehouseRevenue>, StoreError> {
            self.inner.top_warehouses(limit).await
        }

        async fn delete(
            &self,
            warehouse_id: WarehouseId,
            product_id: ProductId,
        ) -> Result<(), StoreError> {
            self.inner.delete(warehouse_id, product_id).await
        }
    }

    #[tokio::test]
    async fn analytics_failure_is_a_partial_success_not_a_rollback() {
        let inventory = Arc::new(InMemoryInventoryStore::new());
        let sink = Arc::new(InMemoryAnalyticsStore::new());
        let warehouse_id = WarehouseId::new();

        let healthy = ProductId::new();
        let cursed = ProductId::new();
        for (product_id, price) in [(healthy, 100), (cursed, 50)] {
            inventory
                .upsert(
                    InventoryRecord::new(
                        product_id,
                        warehouse_id,
                        10,
                        Decimal::new(price, 0),
                        Decimal::ZERO,
                    )
                    .unwrap(),
                )
                .await
                .unwrap();
        }

        let analytics = FlakyAnalytics {
            inner: sink.clone(),
            fail_for: cursed,
        };
        let processor = PurchaseProcessor::new(inventory.clone(), analytics);

        let receipt = processor
            .purchase(
                warehouse_id,
                vec![line(healthy, 2), line(cursed, 1)],
            )
            .await
            .unwrap();

        // Purchase succeeded: both stocks decremented.
        assert_eq!(inventory.get(healthy, warehouse_id).await.unwrap().quantity, 8);
        assert_eq!(inventory.get(cursed, warehouse_id).await.unwrap().quantity, 9);

        // The failing line is reported, the healthy one is recorded.
        assert_eq!(receipt.analytics_failures.len(), 1);
        assert_eq!(receipt.analytics_failures[0].product_id, cursed);

        let sales = sink.list_by_warehouse(warehouse_id).await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].product_id, healthy);
        assert_eq!(sales[0].total_revenue, Decimal::new(200, 0));
    }

    #[tokio::test]
    async fn quote_prices_without_mutating() {
        let fx = fixture();
        let first = stock(&fx, 5, 100, 20).await;
        let second = stock(&fx, 5, 10, 0).await;

        let total = fx
            .processor
            .quote(fx.warehouse_id, vec![line(first, 3), line(second, 2)])
            .await
            .unwrap();

        assert_eq!(total, Decimal::new(260, 0));
        assert_eq!(quantity_of(&fx, first).await, 5);
        assert_eq!(quantity_of(&fx, second).await, 5);
    }

    #[tokio::test]
    async fn quote_surfaces_missing_products() {
        let fx = fixture();
        let ghost = ProductId::new();
        let err = fx
            .processor
            .quote(fx.warehouse_id, vec![line(ghost, 1)])
            .await
            .unwrap_err();
        match err {
            PurchaseError::NotFound { product_id } => assert_eq!(product_id, ghost),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
