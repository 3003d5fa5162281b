//! DTOs for statistics endpoints.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::application::services::stats_service::{DashboardStats, LinkStats};
use crate::domain::entities::{DailyClicks, ReferrerCount};

pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Response for `GET /api/stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_clicks: i64,
    pub total_links: i64,
    pub weekly_change: i64,
    pub top_source: String,
    pub top_source_percentage: i64,
}

impl From<DashboardStats> for DashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_clicks: stats.total_clicks,
            total_links: stats.total_links,
            weekly_change: stats.weekly_change,
            top_source: stats.top_source,
            top_source_percentage: stats.top_source_percentage,
        }
    }
}

/// Query parameters for `GET /api/stats/link/{id}`.
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LinkStatsQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = 365, message = "days must be between 1 and 365"))]
    pub days: Option<i64>,
}

impl LinkStatsQuery {
    pub fn days(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_HISTORY_DAYS)
    }
}

/// Response for `GET /api/stats/link/{id}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkStatsResponse {
    pub click_history: Vec<DailyClicks>,
    pub top_referrers: Vec<ReferrerCount>,
}

impl From<LinkStats> for LinkStatsResponse {
    fn from(stats: LinkStats) -> Self {
        Self {
            click_history: stats.click_history,
            top_referrers: stats.top_referrers,
        }
    }
}
