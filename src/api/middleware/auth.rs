//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{domain::entities::User, error::AppError, state::AppState};

/// The authenticated caller.
///
/// Inserted into request extensions by [`layer`]. As an extractor it rejects
/// unauthenticated requests with `401`; `Option<AuthUser>` accepts them.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Authorization header is missing or invalid"}),
            )
        })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

/// Authenticates requests carrying a session JWT in the Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Authentication Flow
///
/// 1. No `Authorization` header: continue anonymously
/// 2. Extract the bearer token
/// 3. Verify signature and expiry
/// 4. Load the user (tokens of deleted users are rejected)
/// 5. Insert [`AuthUser`] into request extensions
///
/// Handlers decide whether anonymity is acceptable by extracting `AuthUser`
/// or `Option<AuthUser>`.
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is present but malformed, or the
/// token is invalid, expired or belongs to a deleted user.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Ok(next.run(req).await);
    }

    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let user = st.auth_service.authenticate(&token).await.inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected bearer token");
    })?;
    parts.extensions.insert(AuthUser(user));

    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
