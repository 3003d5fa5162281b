//! Slug resolution, click accounting and password verification.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::{Link, NewClick};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::domain::resolution::Resolution;
use crate::error::AppError;
use crate::utils::password::verify_password_blocking;
use crate::utils::unlock_token::UnlockTokenSigner;

/// Credentials a redirect request may carry for a protected link.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlock<'a> {
    /// Plaintext password from the `X-Link-Password` header.
    pub password: Option<&'a str>,
    /// Token previously issued by [`RedirectService::verify`].
    pub token: Option<&'a str>,
}

/// Request metadata captured on a successful resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClickContext<'a> {
    pub referrer: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// Result of a successful password check.
#[derive(Debug, Clone)]
pub struct VerifiedLink {
    pub url: String,
    pub unlock_token: String,
}

/// The hot path: resolves slugs and records exactly one click per successful
/// resolution.
///
/// Every call reads current state from the link store. Clicks are recorded
/// synchronously before the redirect is returned, and the click row and the
/// counter increment are written in one atomic store operation.
pub struct RedirectService<
    L: LinkRepository + ?Sized = dyn LinkRepository,
    C: ClickRepository + ?Sized = dyn ClickRepository,
> {
    link_repository: Arc<L>,
    click_repository: Arc<C>,
    signer: UnlockTokenSigner,
}

impl<L: LinkRepository + ?Sized, C: ClickRepository + ?Sized> RedirectService<L, C> {
    pub fn new(
        link_repository: Arc<L>,
        click_repository: Arc<C>,
        signer: UnlockTokenSigner,
    ) -> Self {
        Self {
            link_repository,
            click_repository,
            signer,
        }
    }

    /// Resolves `slug` and, if it resolves, records a click.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] - unknown slug
    /// - [`AppError::Expired`] - link expired; checked before the password gate
    /// - [`AppError::PasswordRequired`] - protected and `unlock` is missing or wrong
    /// - [`AppError::Internal`] - storage failure while reading or recording
    pub async fn resolve(
        &self,
        slug: &str,
        unlock: Unlock<'_>,
        context: ClickContext<'_>,
    ) -> Result<Link, AppError> {
        let slug = slug.to_ascii_lowercase();
        let link = self.link_repository.get_by_slug(&slug).await?;
        let now = Utc::now();

        let unlocked = match &link {
            Some(link) if link.is_protected() && !link.is_expired_at(now) => {
                self.is_unlocked(link, unlock, now).await
            }
            _ => false,
        };

        let resolution = Resolution::evaluate(link, now, |_| unlocked);
        let outcome = resolution.outcome();
        metrics::counter!("redirect_resolutions_total", "outcome" => outcome).increment(1);

        match resolution {
            Resolution::NotFound => Err(AppError::not_found(
                "Link not found",
                json!({ "slug": slug }),
            )),
            Resolution::Expired { slug } => Err(AppError::expired(
                "Link has expired",
                json!({ "slug": slug }),
            )),
            Resolution::PasswordGated { slug } => Err(AppError::password_required(&slug)),
            Resolution::Resolved { link } => {
                self.record_click(&link, context).await?;
                Ok(link)
            }
        }
    }

    /// Checks a password for a protected link and issues an unlock token.
    ///
    /// Never records a click. The click is counted when the client follows up
    /// with `GET /{slug}?unlock=<token>`.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] - unknown slug
    /// - [`AppError::Expired`] - link expired
    /// - [`AppError::Validation`] - link is not password protected
    /// - [`AppError::InvalidPassword`] - wrong password
    pub async fn verify(&self, slug: &str, password: &str) -> Result<VerifiedLink, AppError> {
        let slug = slug.to_ascii_lowercase();
        let now = Utc::now();

        let link = self
            .link_repository
            .get_by_slug(&slug)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "slug": slug })))?;

        if link.is_expired_at(now) {
            return Err(AppError::expired("Link has expired", json!({ "slug": slug })));
        }

        let Some(hash) = link.password_hash.as_deref() else {
            return Err(AppError::bad_request(
                "Link is not password protected",
                json!({ "slug": slug }),
            ));
        };

        if !verify_password_blocking(password, hash).await? {
            tracing::warn!(slug = %slug, "Invalid link password");
            return Err(AppError::invalid_password(
                "Invalid password",
                json!({ "slug": slug }),
            ));
        }

        Ok(VerifiedLink {
            unlock_token: self.signer.issue(&link, now),
            url: link.original_url,
        })
    }

    async fn is_unlocked(
        &self,
        link: &Link,
        unlock: Unlock<'_>,
        now: chrono::DateTime<Utc>,
    ) -> bool {
        if let Some(token) = unlock.token
            && self.signer.verify(link, token, now)
        {
            return true;
        }

        match (unlock.password, link.password_hash.as_deref()) {
            (Some(password), Some(hash)) => verify_password_blocking(password, hash)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(link_id = link.id, error = %e, "Link password check failed");
                    false
                }),
            _ => false,
        }
    }

    async fn record_click(&self, link: &Link, context: ClickContext<'_>) -> Result<(), AppError> {
        self.click_repository
            .record_and_increment(NewClick::new(link.id, context.referrer, context.user_agent))
            .await?;

        tracing::debug!(link_id = link.id, slug = %link.slug, "Click recorded");
        Ok(())
    }
}
