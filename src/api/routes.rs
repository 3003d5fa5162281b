//! API route configuration.
//!
//! Every route here sits behind [`crate::api::middleware::auth::layer`], which
//! resolves the bearer identity when one is sent. Handlers that need a caller
//! extract [`crate::api::middleware::auth::AuthUser`] and answer `401` without one.

use crate::api::handlers::{
    bulk_delete_handler, create_link_handler, dashboard_handler, delete_link_handler,
    export_links_handler, get_link_handler, link_owner_handler, link_stats_handler,
    list_links_handler, login_handler, me_handler, register_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Read-mostly routes on the public rate limit tier.
///
/// # Endpoints
///
/// - `GET    /links`              - Caller's links, newest first (paginated)
/// - `GET    /links/export`       - Up to 1000 of the caller's links
/// - `GET    /links/owner/{slug}` - Owner email of a link (public)
/// - `GET    /links/{id}`         - One of the caller's links
/// - `PATCH  /links/{id}`         - Partially update a link
/// - `DELETE /links/{id}`         - Delete a link and its clicks
/// - `POST   /links/bulk-delete`  - Delete several links
/// - `GET    /stats`              - Dashboard rollup
/// - `GET    /stats/link/{id}`    - Click history and top referrers
/// - `GET    /auth/me`            - Current user
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler))
        .route("/links/export", get(export_links_handler))
        .route("/links/owner/{slug}", get(link_owner_handler))
        .route(
            "/links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/links/bulk-delete", post(bulk_delete_handler))
        .route("/stats", get(dashboard_handler))
        .route("/stats/link/{id}", get(link_stats_handler))
        .route("/auth/me", get(me_handler))
}

/// Write-heavy and credential routes on the stricter rate limit tier.
///
/// # Endpoints
///
/// - `POST /links`         - Create a short link
/// - `POST /auth/register` - Create an account
/// - `POST /auth/login`    - Obtain a session token
pub fn secure_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
}
