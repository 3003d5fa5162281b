//! User registration, login and session token authentication.

use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::jwt::JwtService;
use crate::utils::password::{hash_password, verify_password_blocking};

pub const MIN_PASSWORD_LENGTH: u64 = 6;

/// A user together with a freshly issued session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Service for account management and Bearer token authentication.
///
/// Session tokens are HS256 JWTs whose subject is the user id. Every
/// authentication re-reads the user, so tokens of deleted users stop working
/// immediately.
pub struct AuthService<U: UserRepository + ?Sized = dyn UserRepository> {
    repository: Arc<U>,
    jwt: JwtService,
}

impl<U: UserRepository + ?Sized> AuthService<U> {
    /// Creates a new authentication service.
    pub fn new(repository: Arc<U>, jwt: JwtService) -> Self {
        Self { repository, jwt }
    }

    /// Registers a user and signs them in.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed email or short password.
    /// Returns [`AppError::Conflict`] if the email is already registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user = self.create_user(email, password).await?;
        let token = self.issue_token(&user)?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(Session { user, token })
    }

    /// Creates a user without issuing a token.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);

        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(AppError::bad_request(
                "Invalid email",
                json!({ "field": "email" }),
            ));
        }

        if (password.chars().count() as u64) < MIN_PASSWORD_LENGTH {
            return Err(AppError::bad_request(
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
                json!({ "field": "password" }),
            ));
        }

        let password_hash = hash_password(password)?;

        self.repository
            .create(NewUser {
                email: email.clone(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                AppError::Conflict { .. } => {
                    AppError::conflict("Email already registered", json!({ "email": email }))
                }
                other => other,
            })
    }

    /// Checks credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] for an unknown email or wrong password,
    /// without revealing which.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);
        let invalid = || AppError::unauthorized("Invalid credentials", json!({}));

        let user = self
            .repository
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password_blocking(password, &user.password_hash).await? {
            tracing::warn!(user_id = user.id, "Failed login attempt");
            return Err(invalid());
        }

        let token = self.issue_token(&user)?;
        Ok(Session { user, token })
    }

    /// Resolves a Bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the token is invalid, expired, or
    /// belongs to a user that no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.jwt.validate(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            AppError::unauthorized("Unauthorized", json!({ "reason": "Invalid or expired token" }))
        })?;

        let user_id = claims.user_id().ok_or_else(|| {
            AppError::unauthorized("Unauthorized", json!({ "reason": "Invalid token subject" }))
        })?;

        self.repository.find_by_id(user_id).await?.ok_or_else(|| {
            AppError::unauthorized("Unauthorized", json!({ "reason": "User no longer exists" }))
        })
    }

    /// Lists all users, newest first.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.repository.list().await
    }

    fn issue_token(&self, user: &User) -> Result<String, AppError> {
        self.jwt.issue(user.id).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign session token");
            AppError::internal("Failed to issue token", json!({}))
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
