//! Click entity representing a single successful redirect.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A click recorded when a link resolves to its target.
///
/// Clicks are append-only; they disappear only when their link is deleted.
#[derive(Debug, Clone)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// Input data for recording a click.
///
/// The timestamp is assigned by the store at insert time.
#[derive(Debug, Clone)]
pub struct NewClick {
    pub link_id: i64,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl NewClick {
    /// Builds a click from raw request header values.
    ///
    /// Empty header values are treated as absent.
    pub fn new(link_id: i64, referrer: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            link_id,
            referrer: non_empty(referrer),
            user_agent: non_empty(user_agent),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Click count for one calendar day (`YYYY-MM-DD`, UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyClicks {
    pub date: String,
    pub count: i64,
}

/// Click count attributed to one referrer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferrerCount {
    pub referrer: String,
    pub count: i64,
}
