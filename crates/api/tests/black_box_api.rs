use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use stockbridge_api::app::{build_app, services::AppServices};
use stockbridge_auth::{SessionClaims, TokenConfig};
use stockbridge_core::CompanyId;

const SECRET: &str = "black-box-secret";
const COOKIE: &str = "next-auth.session-token";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over the in-memory store, on an ephemeral port.
        let config = TokenConfig {
            secret: SECRET.as_bytes().to_vec(),
            ttl: ChronoDuration::hours(1),
        };
        let app = build_app(Arc::new(AppServices::in_memory(config, COOKIE)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, name: &str, email: &str) -> Value {
        let res = self
            .client
            .post(self.url("/api/register"))
            .json(&json!({
                "name": name,
                "address": "1 Dock Road",
                "phone": "555-0100",
                "email": email,
                "password": "password123",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }

    /// Register and log in; returns the session token.
    async fn company(&self, name: &str, email: &str) -> String {
        self.register(name, email).await;
        let res = self
            .client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": "password123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn send(&self, method: reqwest::Method, path: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = self.client.request(method, self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        let body = res.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        self.send(reqwest::Method::GET, path, token, None).await
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::POST, path, token, Some(body)).await
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(reqwest::Method::PUT, path, token, Some(body)).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, company_id: CompanyId) -> String {
    let now = Utc::now();
    let claims = SessionClaims {
        email: "minted@example.com".to_string(),
        company_id,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public_and_protected_routes_require_a_session() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/api/protected")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");

    let forged = mint_jwt("some-other-secret", CompanyId::new());
    let (status, _) = server.get("/api/protected", &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Correctly signed, but for a company that does not exist.
    let (status, _) = server.get("/api/protected", &mint_jwt(SECRET, CompanyId::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let registered = server.register("Minted", "minted@example.com").await;
    let company_id: CompanyId = registered["company"]["id"].as_str().unwrap().parse().unwrap();
    let (status, body) = server.get("/api/protected", &mint_jwt(SECRET, company_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["company_id"], company_id.to_string());
    assert_eq!(body["email"], "minted@example.com");
}

#[tokio::test]
async fn login_sets_a_session_cookie_that_authenticates() {
    let server = TestServer::spawn().await;
    server.register("Acme", "acme@example.com").await;

    let res = server
        .client
        .post(server.url("/api/login"))
        .json(&json!({ "email": " acme@example.com ", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("{COOKIE}=")));
    assert!(cookie.contains("HttpOnly"));

    let pair = cookie.split(';').next().unwrap();
    let res = server
        .client
        .get(server.url("/api/settings"))
        .header(reqwest::header::COOKIE, pair)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let profile: Value = res.json().await.unwrap();
    assert_eq!(profile["email"], "acme@example.com");
    assert!(profile.get("password_hash").is_none());

    let res = server
        .client
        .post(server.url("/api/login"))
        .json(&json!({ "email": "acme@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .post(server.url("/api/register"))
        .json(&json!({
            "name": "Acme again",
            "address": "2 Dock Road",
            "phone": "555-0101",
            "email": "acme@example.com",
            "password": "password456",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn permitted_buyer_orders_and_the_order_runs_its_lifecycle() {
    let server = TestServer::spawn().await;
    let seller = server.company("Seller", "seller@example.com").await;
    let buyer = server.company("Buyer", "buyer@example.com").await;

    let (status, product) = server
        .post(
            "/api/products",
            &seller,
            json!({
                "product_name": "Widget",
                "description": "Blue",
                "price": 2.5,
                "quantity": 10,
                "new_warehouse_name": "Berlin",
                "new_warehouse_location": "DE",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(product["sku"].as_str().unwrap().starts_with("WBE"));
    assert!(product["sku"].as_str().unwrap().ends_with("-P001"));
    assert_eq!(product["quantity"], 10);
    let product_id = product["id"].as_str().unwrap().to_string();

    // Not visible before permission.
    let (_, listed) = server.get("/api/purchase-products", &buyer).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
    let (status, _) = server.get(&format!("/api/products/{product_id}"), &buyer).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, request) = server
        .post("/api/requests", &buyer, json!({ "seller_email": "seller@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["status"], "pending");
    let request_id = request["id"].as_str().unwrap().to_string();

    let (status, _) = server
        .put(&format!("/api/requests/{request_id}"), &buyer, json!({ "status": "permitted" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .put(&format!("/api/requests/{request_id}"), &seller, json!({ "status": "maybe" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, decided) = server
        .put(&format!("/api/requests/{request_id}"), &seller, json!({ "status": "permitted" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "permitted");

    let (_, found) = server.get("/api/requests/search?email=buyer@example.com", &seller).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (_, listed) = server.get("/api/purchase-products", &buyer).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, order) = server
        .post(
            "/api/orders",
            &buyer,
            json!({ "items": [{ "product_id": product_id, "quantity": 2 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], 5.0);
    assert_eq!(order["status"], "Pending");
    let order_id = order["id"].as_str().unwrap().to_string();

    let (_, costs) = server.get("/api/costs", &buyer).await;
    assert_eq!(costs["pendingSpent"], 5.0);
    assert_eq!(costs["completedSpent"], 0.0);
    let (_, costs) = server.get("/api/costs", &seller).await;
    assert_eq!(costs["pendingEarned"], 5.0);

    let (_, sales) = server.get("/api/sales", &seller).await;
    assert_eq!(sales.as_array().unwrap().len(), 1);

    let (status, _) = server
        .put(&format!("/api/orders/{order_id}/deliver"), &seller, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let outsider = server.company("Outsider", "outsider@example.com").await;
    let (status, _) = server
        .put(&format!("/api/orders/{order_id}/accept"), &outsider, json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for (step, expected) in [("accept", "Processing"), ("deliver", "Delivered"), ("complete", "Completed")] {
        let (status, advanced) = server
            .put(&format!("/api/orders/{order_id}/{step}"), &seller, json!({}))
            .await;
        assert_eq!(status, StatusCode::OK, "{step}");
        assert_eq!(advanced["status"], expected);
    }

    let (status, _) = server
        .put(&format!("/api/orders/{order_id}/complete"), &buyer, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, costs) = server.get("/api/costs", &buyer).await;
    assert_eq!(costs["completedSpent"], 5.0);
    assert_eq!(costs["pendingSpent"], 0.0);
}

#[tokio::test]
async fn error_statuses_for_bad_input() {
    let server = TestServer::spawn().await;
    let token = server.company("Solo", "solo@example.com").await;

    let (_, costs) = server.get("/api/costs", &token).await;
    assert_eq!(
        costs,
        json!({ "completedSpent": 0.0, "pendingSpent": 0.0, "completedEarned": 0.0, "pendingEarned": 0.0 })
    );

    let (status, _) = server
        .put(&format!("/api/orders/{}/accept", uuid_string()), &token, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = server.put("/api/orders/not-a-uuid/accept", &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = server
        .post("/api/requests", &token, json!({ "seller_email": "nobody@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post(
            "/api/orders",
            &token,
            json!({ "items": [{ "product_id": uuid_string(), "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.post("/api/orders", &token, json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn referenced_warehouse_cannot_be_deleted() {
    let server = TestServer::spawn().await;
    let token = server.company("Stocker", "stocker@example.com").await;

    let (status, warehouse) = server
        .post("/api/warehouses", &token, json!({ "warehouse_name": "Hamburg", "location": "DE" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let warehouse_id = warehouse["id"].as_str().unwrap().to_string();

    let (status, product) = server
        .post(
            "/api/products",
            &token,
            json!({
                "product_name": "Crate",
                "price": 9,
                "quantity": 3,
                "warehouse_id": warehouse_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().unwrap().to_string();

    let path = format!("/api/warehouses/{warehouse_id}");
    let (status, _) = server.send(reqwest::Method::DELETE, &path, &token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .send(reqwest::Method::DELETE, &format!("/api/products/{product_id}"), &token, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server.send(reqwest::Method::DELETE, &path, &token, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get(&path, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn uuid_string() -> String {
    CompanyId::new().to_string()
}

#[tokio::test]
async fn decimal_prices_add_up_to_a_decimal_total() {
    let server = TestServer::spawn().await;
    let seller = server.company("Seller", "seller@example.com").await;
    let buyer = server.company("Buyer", "buyer@example.com").await;

    let mut ids = Vec::new();
    for (name, price) in [("A", 10.0), ("B", 5.0)] {
        let (status, product) = server
            .post(
                "/api/products",
                &seller,
                json!({
                    "product_name": name,
                    "price": price,
                    "quantity": 5,
                    "new_warehouse_name": "Main",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product["price"], price);
        ids.push(product["id"].as_str().unwrap().to_string());
    }

    let (status, body) = server
        .post(
            "/api/products",
            &seller,
            json!({ "product_name": "C", "price": 1.005, "quantity": 1, "new_warehouse_name": "Main" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (_, request) = server
        .post("/api/requests", &buyer, json!({ "seller_email": "seller@example.com" }))
        .await;
    let request_id = request["id"].as_str().unwrap().to_string();
    server
        .put(&format!("/api/requests/{request_id}"), &seller, json!({ "status": "permitted" }))
        .await;

    let (status, order) = server
        .post(
            "/api/orders",
            &buyer,
            json!({ "items": [
                { "product_id": ids[0], "quantity": 2 },
                { "product_id": ids[1], "quantity": 1 },
            ] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], 25.0);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["items"][0]["price"], 10.0);
}

#[tokio::test]
async fn deleted_account_session_no_longer_authenticates() {
    let server = TestServer::spawn().await;
    let seller = server.company("Seller", "seller@example.com").await;
    let buyer = server.company("Buyer", "buyer@example.com").await;

    let (_, product) = server
        .post(
            "/api/products",
            &seller,
            json!({ "product_name": "Widget", "price": 3.0, "quantity": 5, "new_warehouse_name": "Main" }),
        )
        .await;
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, _) = server.send(reqwest::Method::DELETE, "/api/user", &buyer, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = server
        .post(
            "/api/orders",
            &buyer,
            json!({ "items": [{ "product_id": product_id, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = server.get("/api/settings", &buyer).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, sales) = server.get("/api/sales", &seller).await;
    assert!(sales.as_array().unwrap().is_empty());
}
