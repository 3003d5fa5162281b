//! DTOs for the public redirect and password verification endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters accepted by `GET /{slug}`.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    /// Unlock token issued by `POST /{slug}/verify`.
    pub unlock: Option<String>,
}

/// Request body for `POST /{slug}/verify`.
///
/// An empty password is accepted here and fails the hash check, so unknown
/// and protected slugs answer 404 and 401 rather than a validation error.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(length(max = 256, message = "Password is too long"))]
    pub password: String,
}


#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub url: String,
    pub verified: bool,
    /// Present to `GET /{slug}?unlock=<token>` to follow the link.
    pub unlock_token: String,
}
