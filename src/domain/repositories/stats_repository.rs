//! Repository trait for read-only statistics rollups.

use crate::domain::entities::ReferrerCount;
use crate::error::AppError;
use async_trait::async_trait;

/// Aggregations over links and clicks, optionally scoped to one owner.
///
/// `owner_id = None` aggregates across every link.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Sum of the cached click counters.
    async fn total_clicks(&self, owner_id: Option<i64>) -> Result<i64, AppError>;

    /// Number of links.
    async fn total_links(&self, owner_id: Option<i64>) -> Result<i64, AppError>;

    /// Clicks with `now - start_offset_days <= clicked_at < now - end_offset_days`.
    ///
    /// `(7, 0)` is the last seven days, `(14, 7)` the week before.
    async fn clicks_in_window(
        &self,
        owner_id: Option<i64>,
        start_offset_days: i64,
        end_offset_days: i64,
    ) -> Result<i64, AppError>;

    /// The single most frequent non-null referrer.
    async fn top_referrer(&self, owner_id: Option<i64>) -> Result<Option<ReferrerCount>, AppError>;
}
