//! Handlers for account registration, login and session lookup.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::auth::{AuthResponse, LoginRequest, MeResponse, RegisterRequest};
use crate::api::extract::ValidatedJson;
use crate::api::middleware::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Creates an account and signs it in.
///
/// # Endpoint
///
/// `POST /api/auth/register` with `{"email", "password"}`
///
/// # Errors
///
/// - **400** invalid email or password shorter than 6 characters
/// - **409** email already registered
pub async fn register_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let session = state
        .auth_service
        .register(&payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Exchanges credentials for a session token.
///
/// `POST /api/auth/login`. Wrong email and wrong password both return 401.
pub async fn login_handler(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let session = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(session.into()))
}

/// `GET /api/auth/me`
pub async fn me_handler(AuthUser(user): AuthUser) -> Json<MeResponse> {
    Json(MeResponse { user: user.into() })
}
