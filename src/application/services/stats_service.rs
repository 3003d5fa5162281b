//! Dashboard rollups and per-link click analytics.

use std::sync::Arc;

use crate::domain::entities::{DailyClicks, ReferrerCount};
use crate::domain::repositories::{ClickRepository, LinkRepository, StatsRepository};
use crate::error::AppError;
use serde_json::json;

/// Referrer label used when no click carried a referrer.
pub const DIRECT_SOURCE: &str = "Direct";

/// Referrers returned by [`StatsService::link_stats`].
const TOP_REFERRERS_LIMIT: i64 = 5;

/// Owner-wide summary shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_clicks: i64,
    pub total_links: i64,
    /// Percent change of last 7 days versus the 7 days before, rounded.
    pub weekly_change: i64,
    pub top_source: String,
    pub top_source_percentage: i64,
}

/// Click history for one link.
#[derive(Debug, Clone)]
pub struct LinkStats {
    pub click_history: Vec<DailyClicks>,
    pub top_referrers: Vec<ReferrerCount>,
}

/// Read-only analytics service.
pub struct StatsService<
    S: StatsRepository + ?Sized = dyn StatsRepository,
    L: LinkRepository + ?Sized = dyn LinkRepository,
    C: ClickRepository + ?Sized = dyn ClickRepository,
> {
    stats_repository: Arc<S>,
    link_repository: Arc<L>,
    click_repository: Arc<C>,
}

impl<S, L, C> StatsService<S, L, C>
where
    S: StatsRepository + ?Sized,
    L: LinkRepository + ?Sized,
    C: ClickRepository + ?Sized,
{
    /// Creates a new statistics service.
    pub fn new(
        stats_repository: Arc<S>,
        link_repository: Arc<L>,
        click_repository: Arc<C>,
    ) -> Self {
        Self {
            stats_repository,
            link_repository,
            click_repository,
        }
    }

    /// Builds the dashboard summary for `owner_id` (all links when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn dashboard(&self, owner_id: Option<i64>) -> Result<DashboardStats, AppError> {
        let total_clicks = self.stats_repository.total_clicks(owner_id).await?;
        let total_links = self.stats_repository.total_links(owner_id).await?;
        let this_week = self
            .stats_repository
            .clicks_in_window(owner_id, 7, 0)
            .await?;
        let last_week = self
            .stats_repository
            .clicks_in_window(owner_id, 14, 7)
            .await?;
        let top = self.stats_repository.top_referrer(owner_id).await?;

        let (top_source, top_source_percentage) = match top {
            Some(top) => {
                let percentage = percentage_of(top.count, total_clicks);
                (top.referrer, percentage)
            }
            None => (DIRECT_SOURCE.to_string(), 0),
        };

        Ok(DashboardStats {
            total_clicks,
            total_links,
            weekly_change: weekly_change(this_week, last_week),
            top_source,
            top_source_percentage,
        })
    }

    /// Counts every link in the store.
    ///
    /// Also serves as the storage probe for the health check.
    pub async fn count_all_links(&self) -> Result<i64, AppError> {
        self.stats_repository.total_links(None).await
    }

    /// Click history and top referrers for one of the owner's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link is missing or owned by someone else.
    pub async fn link_stats(
        &self,
        link_id: i64,
        owner_id: i64,
        days: i64,
    ) -> Result<LinkStats, AppError> {
        if !self.link_repository.is_owner(link_id, owner_id).await? {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "id": link_id }),
            ));
        }

        let click_history = self.click_repository.query_by_link(link_id, days).await?;
        let top_referrers = self
            .click_repository
            .top_referrers(link_id, TOP_REFERRERS_LIMIT)
            .await?;

        Ok(LinkStats {
            click_history,
            top_referrers,
        })
    }
}

/// `round((this - last) / last * 100)`, or 0 when there was no traffic last week.
fn weekly_change(this_week: i64, last_week: i64) -> i64 {
    if last_week == 0 {
        return 0;
    }
    (((this_week - last_week) as f64 / last_week as f64) * 100.0).round() as i64
}

fn percentage_of(count: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as i64
}
