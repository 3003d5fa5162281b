//! Link creation and owner-scoped management.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::domain::entities::{Link, LinkPatch, NewLink, QrStyle};
use crate::domain::repositories::{LinkRepository, UserRepository};
use crate::error::AppError;
use crate::utils::password::hash_password;
use crate::utils::slug::{generate_slug, normalize_custom_slug};
use crate::utils::url_validator::validate_url;
use serde_json::json;

/// Attempts at inserting a generated slug before giving up.
const MAX_SLUG_ATTEMPTS: usize = 10;

/// Maximum links returned by an export.
pub const EXPORT_LIMIT: i64 = 1000;

/// Input for creating a link.
#[derive(Debug, Clone, Default)]
pub struct CreateLinkInput {
    pub url: String,
    /// Empty or absent means "generate one".
    pub custom_slug: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Plaintext; empty means unprotected.
    pub password: Option<String>,
    pub qr_style: Option<QrStyle>,
}

/// Input for a partial link update.
///
/// `expires_at` and `password` are tri-state: `None` leaves the field alone,
/// `Some(None)` clears it, `Some(Some(_))` sets it. An empty password also clears.
#[derive(Debug, Clone, Default)]
pub struct UpdateLinkInput {
    pub slug: Option<String>,
    pub original_url: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub password: Option<Option<String>>,
    pub qr_style: Option<QrStyle>,
}

/// Service for creating, listing, updating and deleting links.
///
/// Every operation on an existing link is scoped to its owner. Links owned by
/// someone else are reported as not found.
pub struct LinkService<
    L: LinkRepository + ?Sized = dyn LinkRepository,
    U: UserRepository + ?Sized = dyn UserRepository,
> {
    link_repository: Arc<L>,
    user_repository: Arc<U>,
}

impl<L: LinkRepository + ?Sized, U: UserRepository + ?Sized> LinkService<L, U> {
    /// Creates a new link service.
    pub fn new(link_repository: Arc<L>, user_repository: Arc<U>) -> Self {
        Self {
            link_repository,
            user_repository,
        }
    }

    /// Creates a link owned by `owner_id` (or anonymous when `None`).
    ///
    /// # Slug Selection
    ///
    /// - A non-empty `custom_slug` is trimmed, lowercased and validated. Invalid
    ///   slugs are rejected, never rewritten.
    /// - Otherwise a 6-character slug is generated and inserted directly. A
    ///   storage conflict retries with a fresh slug, up to 10 attempts.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid URL or custom slug.
    /// Returns [`AppError::Conflict`] if the custom slug is taken.
    /// Returns [`AppError::Internal`] if no free slug was found or on storage errors.
    pub async fn create_link(
        &self,
        input: CreateLinkInput,
        owner_id: Option<i64>,
    ) -> Result<Link, AppError> {
        let original_url = validate_url(&input.url).map_err(|e| {
            AppError::bad_request("Invalid URL", json!({ "field": "url", "reason": e.to_string() }))
        })?;

        let password_hash = match input.password.as_deref() {
            Some(password) if !password.is_empty() => Some(hash_password(password)?),
            _ => None,
        };

        let custom_slug = input
            .custom_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut new_link = NewLink {
            slug: String::new(),
            original_url,
            owner_id,
            expires_at: input.expires_at,
            password_hash,
            qr_style: input.qr_style,
        };

        if let Some(custom) = custom_slug {
            let slug = normalize_custom_slug(custom)?;

            if self.link_repository.slug_exists(&slug).await? {
                return Err(AppError::conflict(
                    "Slug already in use",
                    json!({ "slug": slug }),
                ));
            }

            new_link.slug = slug;
            return self.link_repository.create(new_link).await;
        }

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            new_link.slug = generate_slug();

            match self.link_repository.create(new_link.clone()).await {
                Err(AppError::Conflict { .. }) => {
                    tracing::debug!(attempt, slug = %new_link.slug, "Generated slug collided");
                }
                result => return result,
            }
        }

        Err(AppError::internal(
            "Failed to generate unique slug",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    /// Retrieves one of the owner's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist or belongs to someone else.
    pub async fn get_link(&self, id: i64, owner_id: i64) -> Result<Link, AppError> {
        self.link_repository
            .get_by_id(id)
            .await?
            .filter(|link| link.is_owned_by(owner_id))
            .ok_or_else(|| link_not_found(id))
    }

    /// Lists the owner's links, newest first.
    pub async fn list_links(
        &self,
        owner_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        self.link_repository
            .list_by_owner(owner_id, limit, offset)
            .await
    }

    /// Returns up to [`EXPORT_LIMIT`] of the owner's links.
    pub async fn export_links(&self, owner_id: i64) -> Result<Vec<Link>, AppError> {
        self.link_repository
            .list_by_owner(owner_id, EXPORT_LIMIT, 0)
            .await
    }

    /// Applies a partial update to one of the owner's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an invalid slug or URL.
    /// Returns [`AppError::NotFound`] if the link is missing or not owned by the caller.
    /// Returns [`AppError::Conflict`] if a renamed slug is taken.
    pub async fn update_link(
        &self,
        id: i64,
        input: UpdateLinkInput,
        owner_id: i64,
    ) -> Result<Link, AppError> {
        let slug = input
            .slug
            .as_deref()
            .map(normalize_custom_slug)
            .transpose()?;

        let original_url = input
            .original_url
            .as_deref()
            .map(|url| {
                validate_url(url).map_err(|e| {
                    AppError::bad_request(
                        "Invalid URL",
                        json!({ "field": "originalUrl", "reason": e.to_string() }),
                    )
                })
            })
            .transpose()?;

        let password_hash = match input.password {
            None => None,
            Some(None) => Some(None),
            Some(Some(password)) if password.is_empty() => Some(None),
            Some(Some(password)) => Some(Some(hash_password(&password)?)),
        };

        let patch = LinkPatch {
            slug,
            original_url,
            expires_at: input.expires_at,
            password_hash,
            qr_style: input.qr_style,
        };

        if patch.is_empty() {
            return self.get_link(id, owner_id).await;
        }

        self.link_repository
            .update(id, patch, Some(owner_id))
            .await?
            .ok_or_else(|| link_not_found(id))
    }

    /// Deletes one of the owner's links together with its clicks.
    pub async fn delete_link(&self, id: i64, owner_id: i64) -> Result<(), AppError> {
        if self.link_repository.delete(id, Some(owner_id)).await? {
            Ok(())
        } else {
            Err(link_not_found(id))
        }
    }

    /// Deletes the listed links owned by the caller; others are skipped.
    ///
    /// Returns the number of links removed.
    pub async fn bulk_delete(&self, ids: &[i64], owner_id: i64) -> Result<u64, AppError> {
        self.link_repository.bulk_delete(ids, Some(owner_id)).await
    }

    /// Returns the email of the user who owns `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown slugs and anonymous links.
    pub async fn owner_email(&self, slug: &str) -> Result<String, AppError> {
        let slug = slug.trim().to_ascii_lowercase();
        let not_found = || AppError::not_found("Owner not found", json!({ "slug": slug }));

        let owner_id = self
            .link_repository
            .get_by_slug(&slug)
            .await?
            .and_then(|link| link.owner_id)
            .ok_or_else(not_found)?;

        self.user_repository
            .find_by_id(owner_id)
            .await?
            .map(|user| user.email)
            .ok_or_else(not_found)
    }
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::User;
    use crate::domain::repositories::{MockLinkRepository, MockUserRepository};

    fn create_test_link(id: i64, slug: &str, owner_id: Option<i64>) -> Link {
        Link {
            id,
            slug: slug.to_string(),
            original_url: "https://example.com".to_string(),
            owner_id,
            click_count: 0,
            created_at: Utc::now(),
            expires_at: None,
            password_hash: None,
            qr_style: None,
        }
    }

    fn echo_created(new_link: NewLink) -> Result<Link, AppError> {
        Ok(Link {
            id: 1,
            slug: new_link.slug,
            original_url: new_link.original_url,
            owner_id: new_link.owner_id,
            click_count: 0,
            created_at: Utc::now(),
            expires_at: new_link.expires_at,
            password_hash: new_link.password_hash,
            qr_style: new_link.qr_style,
        })
    }

    fn input(url: &str) -> CreateLinkInput {
        CreateLinkInput {
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn service(links: MockLinkRepository) -> LinkService<MockLinkRepository, MockUserRepository> {
        LinkService::new(Arc::new(links), Arc::new(MockUserRepository::new()))
    }

    #[tokio::test]
    async fn test_create_link_generates_slug() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo.expect_slug_exists().times(0);
        mock_link_repo
            .expect_create()
            .withf(|new_link| {
                new_link.slug.len() == 6
                    && new_link
                        .slug
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            })
            .times(1)
            .returning(echo_created);

        let link = service(mock_link_repo)
            .create_link(input("https://example.com"), Some(7))
            .await
            .unwrap();

        assert_eq!(link.owner_id, Some(7));
        assert_eq!(link.click_count, 0);
    }

    #[tokio::test]
    async fn test_create_link_retries_generated_slug_on_conflict() {
        let mut mock_link_repo = MockLinkRepository::new();
        let mut calls = 0;
        mock_link_repo
            .expect_create()
            .times(3)
            .returning(move |new_link| {
                calls += 1;
                if calls < 3 {
                    Err(AppError::conflict("Unique constraint violation", json!({})))
                } else {
                    echo_created(new_link)
                }
            });

        let result = service(mock_link_repo)
            .create_link(input("https://example.com"), None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_link_gives_up_after_max_attempts() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_create()
            .times(MAX_SLUG_ATTEMPTS)
            .returning(|_| Err(AppError::conflict("Unique constraint violation", json!({}))));

        let err = service(mock_link_repo)
            .create_link(input("https://example.com"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_create_link_with_custom_slug_is_normalized() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_slug_exists()
            .withf(|slug| slug == "promo1")
            .times(1)
            .returning(|_| Ok(false));
        mock_link_repo
            .expect_create()
            .withf(|new_link| new_link.slug == "promo1")
            .times(1)
            .returning(echo_created);

        let link = service(mock_link_repo)
            .create_link(
                CreateLinkInput {
                    custom_slug: Some(" Promo1 ".to_string()),
                    ..input("https://example.com/landing")
                },
                Some(1),
            )
            .await
            .unwrap();

        assert_eq!(link.slug, "promo1");
        assert_eq!(link.original_url, "https://example.com/landing");
    }

    #[tokio::test]
    async fn test_create_link_with_empty_custom_slug_generates() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo.expect_slug_exists().times(0);
        mock_link_repo
            .expect_create()
            .times(1)
            .returning(echo_created);

        let link = service(mock_link_repo)
            .create_link(
                CreateLinkInput {
                    custom_slug: Some("   ".to_string()),
                    ..input("https://example.com")
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(link.slug.len(), 6);
    }

    #[tokio::test]
    async fn test_create_link_custom_slug_conflict() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_slug_exists()
            .times(1)
            .returning(|_| Ok(true));
        mock_link_repo.expect_create().times(0);

        let err = service(mock_link_repo)
            .create_link(
                CreateLinkInput {
                    custom_slug: Some("taken".to_string()),
                    ..input("https://example.com")
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_link_rejects_invalid_custom_slug() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo.expect_create().times(0);

        let err = service(mock_link_repo)
            .create_link(
                CreateLinkInput {
                    custom_slug: Some("bad slug!".to_string()),
                    ..input("https://example.com")
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_link_rejects_javascript_url() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo.expect_create().times(0);

        let err = service(mock_link_repo)
            .create_link(input("javascript:alert(1)"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_link_hashes_password() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_create()
            .withf(|new_link| {
                new_link
                    .password_hash
                    .as_deref()
                    .is_some_and(|h| h.starts_with("$argon2id$"))
            })
            .times(1)
            .returning(echo_created);

        let link = service(mock_link_repo)
            .create_link(
                CreateLinkInput {
                    password: Some("secret".to_string()),
                    ..input("https://example.com")
                },
                None,
            )
            .await
            .unwrap();

        assert!(link.is_protected());
    }

    #[tokio::test]
    async fn test_get_link_hides_foreign_links() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_get_by_id()
            .returning(|id| Ok(Some(create_test_link(id, "theirs", Some(2)))));

        let err = service(mock_link_repo).get_link(5, 1).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_link_password_tri_state() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_update()
            .withf(|_, patch, owner| {
                patch.password_hash == Some(None) && patch.expires_at.is_none() && *owner == Some(1)
            })
            .times(2)
            .returning(|id, _, owner| Ok(Some(create_test_link(id, "mine", owner))));

        let service = service(mock_link_repo);

        for password in [None, Some(String::new())] {
            let input = UpdateLinkInput {
                password: Some(password),
                ..Default::default()
            };
            assert!(service.update_link(3, input, 1).await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_update_link_rehashes_new_password() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_update()
            .withf(|_, patch, _| {
                matches!(&patch.password_hash, Some(Some(hash)) if hash.starts_with("$argon2id$"))
            })
            .times(1)
            .returning(|id, _, owner| Ok(Some(create_test_link(id, "mine", owner))));

        let input = UpdateLinkInput {
            password: Some(Some("new-secret".to_string())),
            ..Default::default()
        };

        assert!(service(mock_link_repo).update_link(3, input, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_link_not_owned_is_not_found() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_update()
            .times(1)
            .returning(|_, _, _| Ok(None));

        let input = UpdateLinkInput {
            original_url: Some("https://example.org".to_string()),
            ..Default::default()
        };
        let err = service(mock_link_repo)
            .update_link(3, input, 99)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_link_validates_slug_rename() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo.expect_update().times(0);

        let input = UpdateLinkInput {
            slug: Some("admin".to_string()),
            ..Default::default()
        };
        let err = service(mock_link_repo)
            .update_link(3, input, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_delete_link_not_owned() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_delete()
            .withf(|id, owner| *id == 4 && *owner == Some(2))
            .times(1)
            .returning(|_, _| Ok(false));

        let err = service(mock_link_repo).delete_link(4, 2).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_owner_email_for_anonymous_link_is_not_found() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_get_by_slug()
            .returning(|slug| Ok(Some(create_test_link(1, slug, None))));

        let err = service(mock_link_repo)
            .owner_email("anon")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_owner_email_found() {
        let mut mock_link_repo = MockLinkRepository::new();
        mock_link_repo
            .expect_get_by_slug()
            .returning(|slug| Ok(Some(create_test_link(1, slug, Some(9)))));
        let mut mock_user_repo = MockUserRepository::new();
        mock_user_repo.expect_find_by_id().returning(|id| {
            Ok(Some(User {
                id,
                email: "owner@example.com".to_string(),
                password_hash: "hash".to_string(),
                created_at: Utc::now(),
            }))
        });

        let service = LinkService::new(Arc::new(mock_link_repo), Arc::new(mock_user_repo));

        assert_eq!(
            service.owner_email("promo1").await.unwrap(),
            "owner@example.com"
        );
    }
}
