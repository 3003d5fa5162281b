//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::link_service::{CreateLinkInput, UpdateLinkInput};
use crate::domain::entities::{Link, QrStyle};
use crate::state::AppSettings;

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    /// Target URL; must be absolute http(s).
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Optional custom slug. Empty means "generate one".
    #[validate(length(max = 64))]
    pub custom_slug: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,

    /// Plaintext password; empty means unprotected.
    #[validate(length(max = 256))]
    pub password: Option<String>,

    pub qr_style: Option<QrStyle>,
}

impl From<CreateLinkRequest> for CreateLinkInput {
    fn from(req: CreateLinkRequest) -> Self {
        Self {
            url: req.url,
            custom_slug: req.custom_slug,
            expires_at: req.expires_at,
            password: req.password,
            qr_style: req.qr_style,
        }
    }
}

/// Request body for `PATCH /api/links/{id}`.
///
/// All fields are optional. Only provided fields are changed.
///
/// # Tri-state fields
///
/// `expiresAt` and `password`:
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear (never expires / unprotected)
/// - **Value** → set; an empty password also clears
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinkRequest {
    #[validate(length(max = 64))]
    pub slug: Option<String>,

    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub original_url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub password: Option<Option<String>>,

    pub qr_style: Option<QrStyle>,
}

impl From<UpdateLinkRequest> for UpdateLinkInput {
    fn from(req: UpdateLinkRequest) -> Self {
        Self {
            slug: req.slug,
            original_url: req.original_url,
            expires_at: req.expires_at,
            password: req.password,
            qr_style: req.qr_style,
        }
    }
}

/// Request body for `POST /api/links/bulk-delete`.
#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1, max = 1000, message = "Provide 1-1000 ids"))]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Response for `GET /api/links/owner/{slug}`.
#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    pub email: String,
}

/// JSON representation of a link. The password hash is never exposed.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub slug: String,
    pub short_url: String,
    pub original_url: String,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub owner_id: Option<i64>,
    pub has_password: bool,
    pub qr_style: Option<QrStyle>,
}

impl LinkResponse {
    pub fn from_link(link: Link, settings: &AppSettings) -> Self {
        Self {
            short_url: settings.short_url(&link.slug),
            has_password: link.is_protected(),
            id: link.id,
            slug: link.slug,
            original_url: link.original_url,
            click_count: link.click_count,
            created_at: link.created_at,
            expires_at: link.expires_at,
            owner_id: link.owner_id,
            qr_style: link.qr_style,
        }
    }
}
