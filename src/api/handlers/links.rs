//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;

use crate::api::dto::links::{
    BulkDeleteRequest, BulkDeleteResponse, CreateLinkRequest, LinkResponse, OwnerResponse,
    SuccessResponse, UpdateLinkRequest,
};
use crate::api::dto::pagination::PaginationParams;
use crate::api::extract::ValidatedJson;
use crate::api::middleware::auth::AuthUser;
use crate::domain::entities::Link;
use crate::error::AppError;
use crate::state::{AppSettings, AppState};

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/landing",
///   "customSlug": "promo1",
///   "expiresAt": "2026-12-31T23:59:59Z",
///   "password": "optional",
///   "qrStyle": { "fgColor": "#000000", "bgColor": "#ffffff", "style": "dots" }
/// }
/// ```
///
/// Only `url` is required. Without a bearer token the link is anonymous, which
/// is allowed only when `ALLOW_ANONYMOUS_LINKS` is enabled.
///
/// # Errors
///
/// - **400** invalid URL or slug
/// - **401** no token and anonymous links disabled
/// - **409** custom slug taken
pub async fn create_link_handler(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    let owner_id = match user {
        Some(user) => Some(user.id()),
        None if state.settings.allow_anonymous_links => None,
        None => {
            return Err(AppError::unauthorized(
                "Unauthorized",
                json!({ "reason": "Sign in to create links" }),
            ));
        }
    };

    let link = state
        .link_service
        .create_link(payload.into(), owner_id)
        .await?;

    tracing::info!(slug = %link.slug, owner_id = ?owner_id, "Link created");

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_link(link, &state.settings)),
    ))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links?limit=50&offset=0`
pub async fn list_links_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let (limit, offset) = params
        .validate_and_get_limit_offset()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let links = state
        .link_service
        .list_links(user.id(), limit, offset)
        .await?;

    Ok(Json(to_responses(links, &state.settings)))
}

/// Exports up to 1000 of the caller's links.
///
/// `GET /api/links/export`
pub async fn export_links_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<LinkResponse>>, AppError> {
    let links = state.link_service.export_links(user.id()).await?;

    Ok(Json(to_responses(links, &state.settings)))
}

/// `GET /api/links/{id}`
pub async fn get_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_link(id, user.id()).await?;

    Ok(Json(LinkResponse::from_link(link, &state.settings)))
}

/// Partially updates one of the caller's links.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// # Request Body
///
/// ```json
/// { "slug": "new-slug", "expiresAt": null, "password": "" }
/// ```
///
/// `null` clears `expiresAt`; `null` or `""` clears `password`. Absent fields
/// are left unchanged.
///
/// # Errors
///
/// - **404** link missing or owned by someone else
/// - **409** new slug taken
pub async fn update_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state
        .link_service
        .update_link(id, payload.into(), user.id())
        .await?;

    Ok(Json(LinkResponse::from_link(link, &state.settings)))
}

/// Deletes one of the caller's links along with its clicks.
///
/// `DELETE /api/links/{id}`
pub async fn delete_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SuccessResponse>, AppError> {
    state.link_service.delete_link(id, user.id()).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Deletes every listed link the caller owns. Foreign or unknown ids are skipped.
///
/// `POST /api/links/bulk-delete` with `{"ids": [1, 2, 3]}`
pub async fn bulk_delete_handler(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let deleted = state
        .link_service
        .bulk_delete(&payload.ids, user.id())
        .await?;

    Ok(Json(BulkDeleteResponse {
        success: true,
        deleted,
    }))
}

/// Returns the email of a link's owner.
///
/// `GET /api/links/owner/{slug}` (public). Anonymous links return 404.
pub async fn link_owner_handler(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OwnerResponse>, AppError> {
    let email = state.link_service.owner_email(&slug).await?;

    Ok(Json(OwnerResponse { email }))
}

fn to_responses(links: Vec<Link>, settings: &AppSettings) -> Vec<LinkResponse> {
    links
        .into_iter()
        .map(|link| LinkResponse::from_link(link, settings))
        .collect()
}
