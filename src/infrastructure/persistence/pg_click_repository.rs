//! PostgreSQL implementation of the click log.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Click, DailyClicks, NewClick, ReferrerCount};
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    clicked_at: DateTime<Utc>,
    referrer: Option<String>,
    user_agent: Option<String>,
}

impl From<ClickRow> for Click {
    fn from(row: ClickRow) -> Self {
        Self {
            id: row.id,
            link_id: row.link_id,
            clicked_at: row.clicked_at,
            referrer: row.referrer,
            user_agent: row.user_agent,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DailyRow {
    day: NaiveDate,
    count: i64,
}

#[derive(sqlx::FromRow)]
pub(super) struct ReferrerRow {
    pub(super) referrer: String,
    pub(super) count: i64,
}

impl From<ReferrerRow> for ReferrerCount {
    fn from(row: ReferrerRow) -> Self {
        Self {
            referrer: row.referrer,
            count: row.count,
        }
    }
}

/// A click whose link vanished after lookup hits the foreign key.
fn click_error(e: sqlx::Error, link_id: i64) -> AppError {
    if e
        .as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
    {
        return AppError::not_found("Link not found", json!({ "link_id": link_id }));
    }
    e.into()
}

/// PostgreSQL repository for the append-only click log.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn record(&self, new_click: NewClick) -> Result<Click, AppError> {
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO clicks (link_id, referrer, user_agent)
            VALUES ($1, $2, $3)
            RETURNING id, link_id, clicked_at, referrer, user_agent
            "#,
        )
        .bind(new_click.link_id)
        .bind(&new_click.referrer)
        .bind(&new_click.user_agent)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| click_error(e, new_click.link_id))?;

        Ok(row.into())
    }

    async fn record_and_increment(&self, new_click: NewClick) -> Result<Click, AppError> {
        // Data-modifying CTEs run to completion within the one statement.
        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            WITH inserted AS (
                INSERT INTO clicks (link_id, referrer, user_agent)
                VALUES ($1, $2, $3)
                RETURNING id, link_id, clicked_at, referrer, user_agent
            ), counted AS (
                UPDATE links SET click_count = click_count + 1
                WHERE id = (SELECT link_id FROM inserted)
            )
            SELECT id, link_id, clicked_at, referrer, user_agent FROM inserted
            "#,
        )
        .bind(new_click.link_id)
        .bind(&new_click.referrer)
        .bind(&new_click.user_agent)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| click_error(e, new_click.link_id))?;

        Ok(row.into())
    }

    async fn query_by_link(
        &self,
        link_id: i64,
        window_days: i64,
    ) -> Result<Vec<DailyClicks>, AppError> {
        let rows = sqlx::query_as::<_, DailyRow>(
            r#"
            SELECT (clicked_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
            FROM clicks
            WHERE link_id = $1
              AND clicked_at >= NOW() - make_interval(days => $2::int)
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(link_id)
        .bind(window_days as i32)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DailyClicks {
                date: r.day.format("%Y-%m-%d").to_string(),
                count: r.count,
            })
            .collect())
    }

    async fn top_referrers(
        &self,
        link_id: i64,
        limit: i64,
    ) -> Result<Vec<ReferrerCount>, AppError> {
        let rows = sqlx::query_as::<_, ReferrerRow>(
            r#"
            SELECT referrer, COUNT(*) AS count
            FROM clicks
            WHERE link_id = $1 AND referrer IS NOT NULL
            GROUP BY referrer
            ORDER BY count DESC, referrer ASC
            LIMIT $2
            "#,
        )
        .bind(link_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(ReferrerCount::from).collect())
    }
}
