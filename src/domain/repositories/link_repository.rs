//! Repository trait for link data access.

use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the link store.
///
/// Every mutating operation takes the caller's `owner_id` explicitly. When it is
/// `Some`, rows owned by anyone else are invisible: the call behaves exactly as if
/// the link did not exist.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new link with `click_count = 0`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug already exists. Uniqueness is
    /// enforced by the store itself, so concurrent creates with the same slug
    /// produce exactly one success.
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its (lowercase) slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError>;

    /// Finds a link by id.
    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Lists an owner's links, newest first.
    async fn list_by_owner(
        &self,
        owner_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError>;

    /// Applies a partial update.
    ///
    /// Returns `Ok(None)` if the link does not exist or is not owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a slug rename collides with another link.
    async fn update(
        &self,
        id: i64,
        patch: LinkPatch,
        owner_id: Option<i64>,
    ) -> Result<Option<Link>, AppError>;

    /// Deletes a link and, by cascade, all of its clicks.
    ///
    /// Returns `Ok(false)` if nothing was deleted.
    async fn delete(&self, id: i64, owner_id: Option<i64>) -> Result<bool, AppError>;

    /// Deletes every listed link visible to `owner_id`, returning how many were removed.
    async fn bulk_delete(&self, ids: &[i64], owner_id: Option<i64>) -> Result<u64, AppError>;

    /// Atomically increments `click_count` by one at the storage layer.
    async fn increment_clicks(&self, id: i64) -> Result<(), AppError>;

    /// Returns true if any link uses `slug`. Advisory only.
    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError>;

    /// Returns true if link `id` exists and belongs to `owner_id`.
    async fn is_owner(&self, id: i64, owner_id: i64) -> Result<bool, AppError>;
}
