use std::sync::Arc;

use sqlx::PgPool;

use stockyard_infra::retry::Backoff;
use stockyard_infra::store::{
    AnalyticsStore, InMemoryAnalyticsStore, InMemoryInventoryStore, InMemoryProductStore,
    InMemoryWarehouseStore, InventoryStore, PostgresAnalyticsStore, PostgresInventoryStore,
    PostgresProductStore, PostgresWarehouseStore, ProductStore, WarehouseStore,
};
use stockyard_infra::PurchaseProcessor;

/// Everything the handlers need, behind store trait objects so the same
/// routes run against in-memory wiring (dev/tests) and Postgres
/// (production).
#[derive(Clone)]
pub struct AppServices {
    pub warehouses: Arc<dyn WarehouseStore>,
    pub products: Arc<dyn ProductStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub analytics: Arc<dyn AnalyticsStore>,
    pub processor: PurchaseProcessor<Arc<dyn InventoryStore>, Arc<dyn AnalyticsStore>>,
    /// Backoff applied to idempotent read endpoints.
    pub read_backoff: Backoff,
}

impl AppServices {
    pub fn new(
        warehouses: Arc<dyn WarehouseStore>,
        products: Arc<dyn ProductStore>,
        inventory: Arc<dyn InventoryStore>,
        analytics: Arc<dyn AnalyticsStore>,
    ) -> Self {
        let processor = PurchaseProcessor::new(inventory.clone(), analytics.clone());
        Self {
            warehouses,
            products,
            inventory,
            analytics,
            processor,
            read_backoff: Backoff::default(),
        }
    }
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if use_persistent {
        build_persistent_services().await
    } else {
        build_in_memory_services()
    }
}

pub fn build_in_memory_services() -> AppServices {
    AppServices::new(
        Arc::new(InMemoryWarehouseStore::new()),
        Arc::new(InMemoryProductStore::new()),
        Arc::new(InMemoryInventoryStore::new()),
        Arc::new(InMemoryAnalyticsStore::new()),
    )
}

async fn build_persistent_services() -> AppServices {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    AppServices::new(
        Arc::new(PostgresWarehouseStore::new(pool.clone())),
        Arc::new(PostgresProductStore::new(pool.clone())),
        Arc::new(PostgresInventoryStore::new(pool.clone())),
        Arc::new(PostgresAnalyticsStore::new(pool)),
    )
}
