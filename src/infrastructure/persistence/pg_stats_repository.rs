//! PostgreSQL implementation of statistics repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use super::pg_click_repository::ReferrerRow;
use crate::domain::entities::ReferrerCount;
use crate::domain::repositories::StatsRepository;
use crate::error::AppError;

/// PostgreSQL repository for dashboard rollups.
///
/// Click-derived aggregates join `clicks` to `links` so they can be scoped to an
/// owner. `owner_id = NULL` disables the scope.
pub struct PgStatsRepository {
    pool: Arc<PgPool>,
}

impl PgStatsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn total_clicks(&self, owner_id: Option<i64>) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(click_count), 0)::bigint
            FROM links
            WHERE ($1::bigint IS NULL OR owner_id = $1)
            "#,
        )
        .bind(owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(total)
    }

    async fn total_links(&self, owner_id: Option<i64>) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM links WHERE ($1::bigint IS NULL OR owner_id = $1)",
        )
        .bind(owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(total)
    }

    async fn clicks_in_window(
        &self,
        owner_id: Option<i64>,
        start_offset_days: i64,
        end_offset_days: i64,
    ) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM clicks c
            JOIN links l ON l.id = c.link_id
            WHERE ($1::bigint IS NULL OR l.owner_id = $1)
              AND c.clicked_at >= NOW() - make_interval(days => $2::int)
              AND c.clicked_at <  NOW() - make_interval(days => $3::int)
            "#,
        )
        .bind(owner_id)
        .bind(start_offset_days as i32)
        .bind(end_offset_days as i32)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(total)
    }

    async fn top_referrer(&self, owner_id: Option<i64>) -> Result<Option<ReferrerCount>, AppError> {
        let row = sqlx::query_as::<_, ReferrerRow>(
            r#"
            SELECT c.referrer AS referrer, COUNT(*) AS count
            FROM clicks c
            JOIN links l ON l.id = c.link_id
            WHERE ($1::bigint IS NULL OR l.owner_id = $1)
              AND c.referrer IS NOT NULL
            GROUP BY c.referrer
            ORDER BY count DESC, c.referrer ASC
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ReferrerCount::from))
    }
}
