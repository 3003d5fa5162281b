//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`         - Short link redirect (public, counts a click)
//! - `POST /{slug}/verify`  - Password check for protected links (public)
//! - `GET  /health`         - Storage health check (public)
//! - `/api/*`               - REST API (bearer session where required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket, stricter on writes and credentials
//! - **Authentication** - Bearer JWT resolved to the calling user
//!
//! CORS and trailing-slash normalization wrap the whole router in
//! [`crate::server::run`].

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler, verify_handler};
use crate::api::middleware::rate_limit::{self, RateLimiting, Tier};
use crate::api::middleware::{auth, tracing};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `rate_limiting` - how clients are keyed for rate limiting;
///   [`RateLimiting::Off`] for in-process tests without a peer address
pub fn app_router(state: AppState, rate_limiting: RateLimiting) -> Router {
    let api_public = rate_limit::apply(api::routes::routes(), Tier::Public, rate_limiting);
    let api_secure = rate_limit::apply(api::routes::secure_routes(), Tier::Secure, rate_limiting);

    let api_router = Router::new()
        .merge(api_public)
        .merge(api_secure)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let redirect = rate_limit::apply(
        Router::new().route("/{slug}", get(redirect_handler)),
        Tier::Public,
        rate_limiting,
    );
    let verify = rate_limit::apply(
        Router::new().route("/{slug}/verify", post(verify_handler)),
        Tier::Secure,
        rate_limiting,
    );

    Router::new()
        .merge(redirect)
        .merge(verify)
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
