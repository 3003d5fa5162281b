//! Handlers for short link resolution and password verification.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use crate::api::dto::redirect::{RedirectQuery, VerifyRequest, VerifyResponse};
use crate::api::extract::ValidatedJson;
use crate::api::middleware::cors::LINK_PASSWORD_HEADER;
use crate::application::services::redirect_service::{ClickContext, Unlock};
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a slug to its target URL and records one click.
///
/// # Endpoint
///
/// `GET /{slug}`
///
/// # Unlocking
///
/// Password-protected links resolve only when the request carries either
/// `X-Link-Password: <password>` or `?unlock=<token>` from
/// `POST /{slug}/verify`.
///
/// # Responses
///
/// - **301** with `Location` and `Cache-Control: no-store`, so browsers come
///   back to us and every visit is counted
/// - **404** unknown slug
/// - **410** expired link
/// - **403** `{"error", "code", "requiresPassword": true, "slug"}`
pub async fn redirect_handler(
    Path(slug): Path<String>,
    Query(query): Query<RedirectQuery>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let unlock = Unlock {
        password: header_str(&headers, LINK_PASSWORD_HEADER),
        token: query.unlock.as_deref(),
    };
    let context = ClickContext {
        referrer: header_str(&headers, header::REFERER.as_str()),
        user_agent: header_str(&headers, header::USER_AGENT.as_str()),
    };

    let link = state
        .redirect_service
        .resolve(&slug, unlock, context)
        .await?;

    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [
            (header::LOCATION, link.original_url),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
    ))
}

/// Checks a link password and returns the target plus an unlock token.
///
/// # Endpoint
///
/// `POST /{slug}/verify`
///
/// Does not count a click.
///
/// # Errors
///
/// - **400** link is not password protected, or empty password
/// - **401** wrong password
/// - **404** unknown slug
/// - **410** expired link
pub async fn verify_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let verified = state
        .redirect_service
        .verify(&slug, &payload.password)
        .await?;

    Ok(Json(VerifyResponse {
        url: verified.url,
        verified: true,
        unlock_token: verified.unlock_token,
    }))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
