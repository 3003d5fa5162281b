//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cosmetic QR code settings stored alongside a link.
///
/// Has no effect on resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrStyle {
    pub fg_color: String,
    pub bg_color: String,
    pub style: String,
}

/// A shortened URL with ownership, expiry, gating and click metadata.
#[derive(Debug, Clone)]
pub struct Link {
    pub id: i64,
    pub slug: String,
    pub original_url: String,
    pub owner_id: Option<i64>,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub qr_style: Option<QrStyle>,
}

impl Link {
    /// Returns true if the link has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    /// Returns true if the link has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the link requires a password before redirecting.
    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Returns true if `owner_id` owns this link.
    pub fn is_owned_by(&self, owner_id: i64) -> bool {
        self.owner_id == Some(owner_id)
    }
}

/// Input data for creating a new link.
///
/// `slug` is already validated and `password_hash` already hashed.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub slug: String,
    pub original_url: String,
    pub owner_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub qr_style: Option<QrStyle>,
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged. For the double options, `Some(None)` clears
/// the value and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default)]
pub struct LinkPatch {
    pub slug: Option<String>,
    pub original_url: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub password_hash: Option<Option<String>>,
    pub qr_style: Option<QrStyle>,
}

impl LinkPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.slug.is_none()
            && self.original_url.is_none()
            && self.expires_at.is_none()
            && self.password_hash.is_none()
            && self.qr_style.is_none()
    }
}
