//! Dashboard aggregation queries.

use crate::error::AppResult;
use crate::models::Role;
use anyhow::Context;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Total row counts per entity.
#[derive(Debug, Serialize)]
pub struct Totals {
    pub users: i64,
    pub sites: i64,
    pub pages: i64,
    pub posts: i64,
}

/// Users grouped by role.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RoleCount {
    pub role: Role,
    pub count: i64,
}

/// Pages or posts grouped by publish status.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// One entry of the top-sites ranking.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopSite {
    pub site_id: Uuid,
    pub name: String,
    pub slug: String,
    pub pages_count: i64,
    pub posts_count: i64,
    pub total: i64,
}

/// The admin dashboard rollup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub totals: Totals,
    pub users_by_role: Vec<RoleCount>,
    pub pages_by_status: Vec<StatusCount>,
    pub posts_by_status: Vec<StatusCount>,
    pub top_sites: Vec<TopSite>,
}

impl Overview {
    /// Runs all aggregation queries against the current data.
    pub async fn load(pool: &PgPool) -> AppResult<Self> {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .context("failed to count users")?;
        let sites: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sites")
            .fetch_one(pool)
            .await
            .context("failed to count sites")?;
        let pages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pages")
            .fetch_one(pool)
            .await
            .context("failed to count pages")?;
        let posts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(pool)
            .await
            .context("failed to count posts")?;

        let users_by_role = sqlx::query_as::<_, RoleCount>(
            "SELECT role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role",
        )
        .fetch_all(pool)
        .await
        .context("failed to group users by role")?;

        let pages_by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM pages GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
        .context("failed to group pages by status")?;

        let posts_by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM posts GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
        .context("failed to group posts by status")?;

        // DISTINCT counts because the double LEFT JOIN multiplies rows.
        let top_sites = sqlx::query_as::<_, TopSite>(
            r#"
            SELECT s.id AS site_id, s.name, s.slug,
                   COUNT(DISTINCT p.id) AS pages_count,
                   COUNT(DISTINCT o.id) AS posts_count,
                   COUNT(DISTINCT p.id) + COUNT(DISTINCT o.id) AS total
            FROM sites s
            LEFT JOIN pages p ON p.site_id = s.id
            LEFT JOIN posts o ON o.site_id = s.id
            GROUP BY s.id, s.name, s.slug
            ORDER BY total DESC
            LIMIT 5
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to rank top sites")?;

        Ok(Self {
            totals: Totals {
                users,
                sites,
                pages,
                posts,
            },
            users_by_role,
            pages_by_status,
            posts_by_status,
            top_sites,
        })
    }
}
