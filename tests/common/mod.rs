#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use coapp_api::{
    config::AppConfig,
    db::{self, DbConfig, DbPool},
    services::users::NewUser,
    AppState,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const TEST_PASSWORD: &str = "secret123";

/// Helper harness for spinning up the full router backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with a fresh, migrated database.
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory_sqlite())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_001,
            "development".to_string(),
        );

        let state = AppState::new(Arc::new(pool), cfg);
        let router = coapp_api::build_router(state.clone());
        Self { router, state }
    }

    pub fn db(&self) -> Arc<DbPool> {
        self.state.db.clone()
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Request and decode, asserting the expected status.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        expected: StatusCode,
    ) -> Value {
        let response = self.request(method.clone(), uri, body, token).await;
        let status = response.status();
        let payload = body_json(response).await;
        assert_eq!(
            status, expected,
            "{} {} returned {}: {}",
            method, uri, status, payload
        );
        payload
    }

    /// Registers a user over HTTP and returns `(user_id, access_token)`.
    pub async fn register(&self, email: &str) -> (i32, String) {
        let payload = self
            .json(
                Method::POST,
                "/auth/register",
                Some(json!({
                    "email": email,
                    "full_name": "Test User",
                    "password": TEST_PASSWORD,
                })),
                None,
                StatusCode::CREATED,
            )
            .await;
        let user_id = payload["user"]["id"].as_i64().expect("user id") as i32;
        let token = payload["access_token"]
            .as_str()
            .expect("access token")
            .to_string();
        (user_id, token)
    }

    /// Registers a user directly through the service layer.
    pub async fn user(&self, email: &str) -> i32 {
        self.state
            .services
            .users
            .register(NewUser {
                email: email.to_string(),
                full_name: "Service User".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .expect("register user")
            .id
    }

    pub async fn create_company(&self, token: &str, name: &str) -> i32 {
        let payload = self
            .json(
                Method::POST,
                "/companies",
                Some(json!({ "name": name })),
                Some(token),
                StatusCode::CREATED,
            )
            .await;
        id_of(&payload)
    }

    pub async fn create_material(
        &self,
        token: &str,
        company_id: i32,
        sku: &str,
        current_stock: &str,
        min_stock: &str,
    ) -> i32 {
        let payload = self
            .json(
                Method::POST,
                "/materials",
                Some(json!({
                    "company_id": company_id,
                    "name": format!("Material {sku}"),
                    "sku": sku,
                    "current_stock": current_stock,
                    "min_stock": min_stock,
                })),
                Some(token),
                StatusCode::CREATED,
            )
            .await;
        id_of(&payload)
    }

    pub async fn create_purchase(&self, token: &str, company_id: i32, invoice: &str) -> i32 {
        let payload = self
            .json(
                Method::POST,
                "/purchases",
                Some(json!({
                    "company_id": company_id,
                    "invoice_number": invoice,
                    "supplier_name": "Tech Distributors LLC",
                    "purchase_date": "2025-01-15T10:00:00Z",
                })),
                Some(token),
                StatusCode::CREATED,
            )
            .await;
        id_of(&payload)
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("response body is not json")
}

pub fn id_of(payload: &Value) -> i32 {
    payload["id"].as_i64().expect("payload has an id") as i32
}

/// Decimals come back as strings; SQLite may also hand them back as floats.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}
