#![allow(dead_code)]

use axum::Router;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use serde_json::{Value, json};
use snaplink::api::middleware::rate_limit::RateLimiting;
use snaplink::config::{Config, StorageBackend};
use snaplink::infrastructure::Repositories;
use snaplink::routes::app_router;
use snaplink::state::AppState;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const TEST_SECRET: &str = "test-signing-secret-0123456789";
pub const BASE_URL: &str = "https://snap.test";

pub fn test_config(allow_anonymous_links: bool) -> Config {
    Config {
        storage_backend: StorageBackend::Memory,
        database_url: None,
        listen_addr: "127.0.0.1:0".to_string(),
        base_url: BASE_URL.to_string(),
        log_level: "info".to_string(),
        log_format: "text".to_string(),
        behind_proxy: false,
        token_signing_secret: TEST_SECRET.to_string(),
        jwt_ttl_hours: 1,
        unlock_token_ttl_seconds: 300,
        allow_anonymous_links,
        cors_origins: vec![],
        db_max_connections: 1,
        db_connect_timeout: 5,
        db_idle_timeout: 60,
        db_max_lifetime: 60,
    }
}

/// Application state over a fresh in-memory store.
pub fn memory_state(allow_anonymous_links: bool) -> AppState {
    AppState::new(
        Repositories::in_memory(),
        &test_config(allow_anonymous_links),
        "memory",
    )
}

/// Application state over a PostgreSQL pool.
pub fn postgres_state(pool: PgPool) -> AppState {
    AppState::new(
        Repositories::postgres(Arc::new(pool)),
        &test_config(false),
        "postgres",
    )
}

pub fn test_app(state: AppState) -> Router {
    app_router(state, RateLimiting::Off)
}

pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(test_app(state)).unwrap()
}

/// Registers `email` and returns its session token.
pub async fn register(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "email": email, "password": "password123" }))
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Creates a link as `token` and returns the response body.
pub async fn create_link(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/api/links")
        .authorization_bearer(token)
        .json(&body)
        .await;

    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()
}

/// Reads a link's current click counter through the API.
pub async fn click_count(server: &TestServer, token: &str, id: i64) -> i64 {
    let response = server
        .get(&format!("/api/links/{id}"))
        .authorization_bearer(token)
        .await;

    response.assert_status_ok();
    response.json::<Value>()["click_count"].as_i64().unwrap()
}

/// Injects a fixed peer address, as `into_make_service_with_connect_info` does.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
