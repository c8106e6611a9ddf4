use std::collections::HashMap;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use stockyard_api::app::{app_with_services, services::build_in_memory_services};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory stores, ephemeral port.
        let app = app_with_services(Arc::new(build_in_memory_services()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_warehouse(client: &reqwest::Client, base_url: &str) -> String {
    let res = client
        .post(format!("{}/api/warehouse", base_url))
        .json(&json!({ "name": "North", "address": "12 Dock Rd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn create_product(client: &reqwest::Client, base_url: &str, name: &str) -> String {
    let res = client
        .post(format!("{}/api/product", base_url))
        .json(&json!({ "name": name, "weight": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn stock_product(
    client: &reqwest::Client,
    base_url: &str,
    warehouse_id: &str,
    product_id: &str,
    quantity: i64,
    price: i64,
    discount: i64,
) {
    let res = client
        .post(format!("{}/api/inventory", base_url))
        .json(&json!({
            "product_id": product_id,
            "warehouse_id": warehouse_id,
            "quantity": quantity,
            "price": price,
            "discount": discount,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

fn items(entries: &[(&str, i64)]) -> serde_json::Value {
    let map: HashMap<String, i64> = entries
        .iter()
        .map(|(id, qty)| (id.to_string(), *qty))
        .collect();
    json!({ "items": map })
}

async fn stock_quantity(
    client: &reqwest::Client,
    base_url: &str,
    warehouse_id: &str,
    product_id: &str,
) -> i64 {
    let res = client
        .get(format!("{}/api/inventory/{}/{}", base_url, warehouse_id, product_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn purchase_flow_end_to_end() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&client, &srv.base_url).await;
    let product_id = create_product(&client, &srv.base_url, "Widget").await;
    stock_product(&client, &srv.base_url, &warehouse_id, &product_id, 5, 100, 20).await;

    // Quote first: 3 * (100 * 0.8) = 240, no mutation.
    let res = client
        .post(format!("{}/api/inventory/calculate/{}", srv.base_url, warehouse_id))
        .json(&items(&[(product_id.as_str(), 3)]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total"], json!("240"));
    assert_eq!(
        stock_quantity(&client, &srv.base_url, &warehouse_id, &product_id).await,
        5
    );

    // Purchase 3 of 5.
    let res = client
        .post(format!("{}/api/inventory/purchase/{}", srv.base_url, warehouse_id))
        .json(&items(&[(product_id.as_str(), 3)]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let receipt: serde_json::Value = res.json().await.unwrap();
    assert_eq!(receipt["lines"][0]["product_id"].as_str().unwrap(), product_id);
    assert_eq!(receipt["lines"][0]["quantity"], json!(3));
    assert_eq!(receipt["lines"][0]["unit_price_charged"], json!("80"));
    assert_eq!(receipt["lines"][0]["line_total"], json!("240"));
    assert_eq!(receipt["grand_total"], json!("240"));
    assert!(receipt["analytics_failures"].as_array().unwrap().is_empty());

    assert_eq!(
        stock_quantity(&client, &srv.base_url, &warehouse_id, &product_id).await,
        2
    );

    // The sale landed in analytics.
    let res = client
        .get(format!("{}/api/analytics/{}", srv.base_url, warehouse_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let analytics: serde_json::Value = res.json().await.unwrap();
    let rows = analytics.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sold_quantity"], json!(3));
    assert_eq!(rows[0]["total_revenue"], json!("240"));

    // Asking for more than remains is a conflict and changes nothing.
    let res = client
        .post(format!("{}/api/inventory/purchase/{}", srv.base_url, warehouse_id))
        .json(&items(&[(product_id.as_str(), 10)]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], json!("insufficient_stock"));
    assert!(body["message"].as_str().unwrap().contains(&product_id));

    assert_eq!(
        stock_quantity(&client, &srv.base_url, &warehouse_id, &product_id).await,
        2
    );
    let res = client
        .get(format!("{}/api/analytics/{}", srv.base_url, warehouse_id))
        .send()
        .await
        .unwrap();
    let analytics: serde_json::Value = res.json().await.unwrap();
    assert_eq!(analytics.as_array().unwrap()[0]["sold_quantity"], json!(3));
}

#[tokio::test]
async fn failed_multi_line_purchase_rolls_back() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&client, &srv.base_url).await;
    let plenty = create_product(&client, &srv.base_url, "Plenty").await;
    let scarce = create_product(&client, &srv.base_url, "Scarce").await;
    stock_product(&client, &srv.base_url, &warehouse_id, &plenty, 5, 100, 0).await;
    stock_product(&client, &srv.base_url, &warehouse_id, &scarce, 1, 50, 0).await;

    let res = client
        .post(format!("{}/api/inventory/purchase/{}", srv.base_url, warehouse_id))
        .json(&items(&[(plenty.as_str(), 2), (scarce.as_str(), 3)]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Neither line's decrement survived the failure.
    assert_eq!(
        stock_quantity(&client, &srv.base_url, &warehouse_id, &plenty).await,
        5
    );
    assert_eq!(
        stock_quantity(&client, &srv.base_url, &warehouse_id, &scarce).await,
        1
    );
}

#[tokio::test]
async fn purchase_of_unstocked_product_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&client, &srv.base_url).await;
    let ghost = uuid::Uuid::now_v7().to_string();

    let res = client
        .post(format!("{}/api/inventory/purchase/{}", srv.base_url, warehouse_id))
        .json(&items(&[(ghost.as_str(), 1)]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_purchase_payloads_are_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&client, &srv.base_url).await;
    let product_id = create_product(&client, &srv.base_url, "Widget").await;
    stock_product(&client, &srv.base_url, &warehouse_id, &product_id, 5, 100, 0).await;

    // Zero quantity.
    let res = client
        .post(format!("{}/api/inventory/purchase/{}", srv.base_url, warehouse_id))
        .json(&items(&[(product_id.as_str(), 0)]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Empty item set.
    let res = client
        .post(format!("{}/api/inventory/purchase/{}", srv.base_url, warehouse_id))
        .json(&items(&[]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Nothing was decremented along the way.
    assert_eq!(
        stock_quantity(&client, &srv.base_url, &warehouse_id, &product_id).await,
        5
    );
}

#[tokio::test]
async fn discount_outside_range_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&client, &srv.base_url).await;
    let product_id = create_product(&client, &srv.base_url, "Widget").await;
    stock_product(&client, &srv.base_url, &warehouse_id, &product_id, 5, 100, 0).await;

    let res = client
        .put(format!("{}/api/inventory/discount/{}", srv.base_url, warehouse_id))
        .json(&json!({ "product_ids": [product_id], "discount": 150 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // A valid discount applies and reports the updated count.
    let res = client
        .put(format!("{}/api/inventory/discount/{}", srv.base_url, warehouse_id))
        .json(&json!({ "product_ids": [product_id], "discount": 25 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["updated"], json!(1));
}

#[tokio::test]
async fn replenishment_increases_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let warehouse_id = create_warehouse(&client, &srv.base_url).await;
    let product_id = create_product(&client, &srv.base_url, "Widget").await;
    stock_product(&client, &srv.base_url, &warehouse_id, &product_id, 5, 100, 0).await;

    let res = client
        .put(format!(
            "{}/api/inventory/update/{}/{}",
            srv.base_url, warehouse_id, product_id
        ))
        .json(&json!({ "quantity": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(
        stock_quantity(&client, &srv.base_url, &warehouse_id, &product_id).await,
        12
    );
}

#[tokio::test]
async fn warehouse_crud_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let id = create_warehouse(&client, &srv.base_url).await;

    let res = client
        .get(format!("{}/api/warehouses", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let list: serde_json::Value = res.json().await.unwrap();
    assert!(list
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w["id"].as_str() == Some(id.as_str())));

    let res = client
        .put(format!("{}/api/warehouse/update/{}", srv.base_url, id))
        .json(&json!({ "address": "7 Pier Ln" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(format!("{}/api/warehouse/delete/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Gone now.
    let res = client
        .put(format!("{}/api/warehouse/update/{}", srv.base_url, id))
        .json(&json!({ "address": "nowhere" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn top_warehouses_ranks_by_revenue() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let big = create_warehouse(&client, &srv.base_url).await;
    let small = create_warehouse(&client, &srv.base_url).await;
    let product_id = create_product(&client, &srv.base_url, "Widget").await;

    stock_product(&client, &srv.base_url, &big, &product_id, 100, 100, 0).await;
    stock_product(&client, &srv.base_url, &small, &product_id, 100, 100, 0).await;

    for (warehouse_id, quantity) in [(&big, 9), (&small, 1)] {
        let res = client
            .post(format!("{}/api/inventory/purchase/{}", srv.base_url, warehouse_id))
            .json(&items(&[(product_id.as_str(), quantity)]))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client
        .get(format!("{}/api/analytics/top?limit=5", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ranking: serde_json::Value = res.json().await.unwrap();
    let rows = ranking.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["warehouse_id"].as_str(), Some(big.as_str()));
    assert_eq!(rows[0]["total_revenue"], json!("900"));
    assert_eq!(rows[0]["address"].as_str(), Some("12 Dock Rd"));
    assert_eq!(rows[1]["warehouse_id"].as_str(), Some(small.as_str()));
}
