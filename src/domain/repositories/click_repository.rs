//! Repository trait for the append-only click log.

use crate::domain::entities::{Click, DailyClicks, NewClick, ReferrerCount};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for recording and querying click events.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends one click event. Referrer and user agent are stored verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if `link_id` does not exist and
    /// [`AppError::Internal`] on other storage errors.
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError>;

    /// Appends one click event and increments the link's `click_count` as a
    /// single atomic step. Either both happen or neither does.
    ///
    /// # Errors
    ///
    /// Same as [`ClickRepository::record`].
    async fn record_and_increment(&self, new_click: NewClick) -> Result<Click, AppError>;

    /// Clicks per UTC calendar day within the trailing `window_days`, oldest day first.
    ///
    /// Days without clicks are omitted.
    async fn query_by_link(
        &self,
        link_id: i64,
        window_days: i64,
    ) -> Result<Vec<DailyClicks>, AppError>;

    /// Most frequent non-null referrers for a link, highest count first.
    async fn top_referrers(&self, link_id: i64, limit: i64)
    -> Result<Vec<ReferrerCount>, AppError>;
}
