//! Page model and CRUD operations.
//!
//! Page bodies are a versioned block tree stored verbatim as JSON; the
//! application validates only the outer shape, never individual blocks.

use crate::error::{AppResult, unique_violation};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Page record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub site_id: Uuid,
    pub template_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub content: serde_json::Value,
    pub status: String,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new page.
#[derive(Debug)]
pub struct CreatePage {
    pub site_id: Uuid,
    pub template_id: Option<Uuid>,
    pub title: String,
    pub slug: String,
    pub content: serde_json::Value,
    pub status: String,
    pub created_by_id: Uuid,
}

/// Partial update. `template_id: Some(None)` clears the template reference.
#[derive(Debug, Default)]
pub struct UpdatePage {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub template_id: Option<Option<Uuid>>,
    pub status: Option<String>,
    pub content: Option<serde_json::Value>,
}

impl Page {
    /// Find a page by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> AppResult<Option<Self>> {
        let page = sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch page by id")?;

        Ok(page)
    }

    /// Find a page by its site-scoped slug.
    pub async fn find_by_slug(pool: &PgPool, site_id: Uuid, slug: &str) -> AppResult<Option<Self>> {
        let page = sqlx::query_as::<_, Page>("SELECT * FROM pages WHERE site_id = $1 AND slug = $2")
            .bind(site_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
            .context("failed to fetch page by slug")?;

        Ok(page)
    }

    /// List pages, newest first, optionally restricted to one site.
    pub async fn list(pool: &PgPool, site_id: Option<Uuid>) -> AppResult<Vec<Self>> {
        let pages = match site_id {
            Some(site_id) => {
                sqlx::query_as::<_, Page>(
                    "SELECT * FROM pages WHERE site_id = $1 ORDER BY created_at DESC, id DESC",
                )
                .bind(site_id)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Page>("SELECT * FROM pages ORDER BY created_at DESC, id DESC")
                    .fetch_all(pool)
                    .await
            }
        }
        .context("failed to list pages")?;

        Ok(pages)
    }

    /// True when a page with this slug exists in the site, optionally
    /// excluding one id.
    pub async fn slug_exists(
        pool: &PgPool,
        site_id: Uuid,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM pages WHERE site_id = $1 AND slug = $2 AND ($3::uuid IS NULL OR id <> $3))",
        )
        .bind(site_id)
        .bind(slug)
        .bind(exclude)
        .fetch_one(pool)
        .await
        .context("failed to check page slug")?;

        Ok(exists)
    }

    /// Create a new page. A duplicate site-scoped slug surfaces as `Conflict`.
    pub async fn create(pool: &PgPool, input: CreatePage) -> AppResult<Self> {
        let id = Uuid::now_v7();

        let page = sqlx::query_as::<_, Page>(
            r#"
            INSERT INTO pages (id, site_id, template_id, title, slug, content, status, created_by_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.site_id)
        .bind(input.template_id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.content)
        .bind(&input.status)
        .bind(input.created_by_id)
        .fetch_one(pool)
        .await
        .map_err(unique_violation("Slug already exists for this site"))?;

        Ok(page)
    }

    /// Update a page. Only fields present in the patch are touched.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdatePage) -> AppResult<Option<Self>> {
        // Build dynamic update query
        let mut query = String::from("UPDATE pages SET ");
        let mut params: Vec<String> = Vec::new();
        let mut param_idx = 1;

        if input.title.is_some() {
            params.push(format!("title = ${param_idx}"));
            param_idx += 1;
        }
        if input.slug.is_some() {
            params.push(format!("slug = ${param_idx}"));
            param_idx += 1;
        }
        if input.template_id.is_some() {
            params.push(format!("template_id = ${param_idx}"));
            param_idx += 1;
        }
        if input.status.is_some() {
            params.push(format!("status = ${param_idx}"));
            param_idx += 1;
        }
        if input.content.is_some() {
            params.push(format!("content = ${param_idx}"));
            param_idx += 1;
        }

        if params.is_empty() {
            // Nothing to update, just return the page
            return Self::find_by_id(pool, id).await;
        }

        params.push("updated_at = NOW()".to_string());
        query.push_str(&params.join(", "));
        query.push_str(&format!(" WHERE id = ${param_idx} RETURNING *"));

        let mut query_builder = sqlx::query_as::<_, Page>(&query);
        if let Some(ref title) = input.title {
            query_builder = query_builder.bind(title);
        }
        if let Some(ref slug) = input.slug {
            query_builder = query_builder.bind(slug);
        }
        if let Some(ref template_id) = input.template_id {
            query_builder = query_builder.bind(template_id);
        }
        if let Some(ref status) = input.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(ref content) = input.content {
            query_builder = query_builder.bind(content);
        }
        query_builder = query_builder.bind(id);

        let page = query_builder
            .fetch_optional(pool)
            .await
            .map_err(unique_violation("Slug already exists for this site"))?;

        Ok(page)
    }

    /// Delete a page.
    pub async fn delete(pool: &PgPool, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM pages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete page")?;

        Ok(result.rows_affected() > 0)
    }
}
