//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkPatch, NewLink, QrStyle};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, slug, original_url, owner_id, click_count, created_at, \
                            expires_at, password_hash, qr_style";

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    slug: String,
    original_url: String,
    owner_id: Option<i64>,
    click_count: i64,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    password_hash: Option<String>,
    qr_style: Option<Json<QrStyle>>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            original_url: row.original_url,
            owner_id: row.owner_id,
            click_count: row.click_count,
            created_at: row.created_at,
            expires_at: row.expires_at,
            password_hash: row.password_hash,
            qr_style: row.qr_style.map(|Json(style)| style),
        }
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Slug uniqueness is enforced by the `links_slug_key` constraint, so a racing
/// insert surfaces as [`AppError::Conflict`].
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            INSERT INTO links (slug, original_url, owner_id, expires_at, password_hash, qr_style)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.slug)
            .bind(&new_link.original_url)
            .bind(new_link.owner_id)
            .bind(new_link.expires_at)
            .bind(&new_link.password_hash)
            .bind(new_link.qr_style.map(Json))
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE slug = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1");

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn list_by_owner(
        &self,
        owner_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn update(
        &self,
        id: i64,
        patch: LinkPatch,
        owner_id: Option<i64>,
    ) -> Result<Option<Link>, AppError> {
        // Double options are split into a "touch" flag and the new value.
        let set_expiry = patch.expires_at.is_some();
        let expires_at = patch.expires_at.flatten();
        let set_password = patch.password_hash.is_some();
        let password_hash = patch.password_hash.flatten();

        let sql = format!(
            r#"
            UPDATE links SET
                slug          = COALESCE($2, slug),
                original_url  = COALESCE($3, original_url),
                expires_at    = CASE WHEN $4 THEN $5::timestamptz ELSE expires_at END,
                password_hash = CASE WHEN $6 THEN $7::text ELSE password_hash END,
                qr_style      = COALESCE($8::jsonb, qr_style)
            WHERE id = $1 AND ($9::bigint IS NULL OR owner_id = $9)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .bind(patch.slug)
            .bind(patch.original_url)
            .bind(set_expiry)
            .bind(expires_at)
            .bind(set_password)
            .bind(password_hash)
            .bind(patch.qr_style.map(Json))
            .bind(owner_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn delete(&self, id: i64, owner_id: Option<i64>) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM links WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)")
                .bind(id)
                .bind(owner_id)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn bulk_delete(&self, ids: &[i64], owner_id: Option<i64>) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "DELETE FROM links WHERE id = ANY($1) AND ($2::bigint IS NULL OR owner_id = $2)",
        )
        .bind(ids)
        .bind(owner_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn increment_clicks(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE links SET click_count = click_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM links WHERE slug = $1)")
            .bind(slug)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(exists)
    }

    async fn is_owner(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM links WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(owned)
    }
}
