//! Post model and CRUD operations.
//!
//! Unlike pages, posts carry an author and mutation is open to that author
//! as well as administrators.

use crate::error::{AppResult, unique_violation};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Post record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub site_id: Uuid,
    pub template_id: Option<Uuid>,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: serde_json::Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new post.
#[derive(Debug)]
pub struct CreatePost {
    pub site_id: Uuid,
    pub template_id: Option<Uuid>,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: serde_json::Value,
    pub status: String,
}

/// Partial update. `template_id: Some(None)` clears the template reference.
#[derive(Debug, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub template_id: Option<Option<Uuid>>,
    pub status: Option<String>,
    pub content: Option<serde_json::Value>,
}

/// Filters for the post listing.
#[derive(Debug, Default)]
pub struct PostFilters {
    pub site_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub status: Option<String>,
}

impl Post {
    /// Find a post by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> AppResult<Option<Self>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch post by id")?;

        Ok(post)
    }

    /// Find a post by its site-scoped slug.
    pub async fn find_by_slug(pool: &PgPool, site_id: Uuid, slug: &str) -> AppResult<Option<Self>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE site_id = $1 AND slug = $2")
            .bind(site_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
            .context("failed to fetch post by slug")?;

        Ok(post)
    }

    /// List posts, newest first, with optional filters.
    pub async fn list(pool: &PgPool, filters: PostFilters) -> AppResult<Vec<Self>> {
        // Build dynamic filter query
        let mut query = String::from("SELECT * FROM posts");
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx = 1;

        if filters.site_id.is_some() {
            conditions.push(format!("site_id = ${param_idx}"));
            param_idx += 1;
        }
        if filters.author_id.is_some() {
            conditions.push(format!("author_id = ${param_idx}"));
            param_idx += 1;
        }
        if filters.status.is_some() {
            conditions.push(format!("status = ${param_idx}"));
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY created_at DESC, id DESC");

        let mut query_builder = sqlx::query_as::<_, Post>(&query);
        if let Some(site_id) = filters.site_id {
            query_builder = query_builder.bind(site_id);
        }
        if let Some(author_id) = filters.author_id {
            query_builder = query_builder.bind(author_id);
        }
        if let Some(ref status) = filters.status {
            query_builder = query_builder.bind(status);
        }

        let posts = query_builder
            .fetch_all(pool)
            .await
            .context("failed to list posts")?;

        Ok(posts)
    }

    /// True when a post with this slug exists in the site, optionally
    /// excluding one id.
    pub async fn slug_exists(
        pool: &PgPool,
        site_id: Uuid,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE site_id = $1 AND slug = $2 AND ($3::uuid IS NULL OR id <> $3))",
        )
        .bind(site_id)
        .bind(slug)
        .bind(exclude)
        .fetch_one(pool)
        .await
        .context("failed to check post slug")?;

        Ok(exists)
    }

    /// Create a new post. A duplicate site-scoped slug surfaces as `Conflict`.
    pub async fn create(pool: &PgPool, input: CreatePost) -> AppResult<Self> {
        let id = Uuid::now_v7();

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, site_id, template_id, author_id, title, slug, content, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.site_id)
        .bind(input.template_id)
        .bind(input.author_id)
        .bind(&input.title)
        .bind(&input.slug)
        .bind(&input.content)
        .bind(&input.status)
        .fetch_one(pool)
        .await
        .map_err(unique_violation("Slug already exists for this site"))?;

        Ok(post)
    }

    /// Update a post. Only fields present in the patch are touched.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdatePost) -> AppResult<Option<Self>> {
        // Build dynamic update query
        let mut query = String::from("UPDATE posts SET ");
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
            // Nothing to update, just return the post
            return Self::find_by_id(pool, id).await;
        }

        params.push("updated_at = NOW()".to_string());
        query.push_str(&params.join(", "));
        query.push_str(&format!(" WHERE id = ${param_idx} RETURNING *"));

        let mut query_builder = sqlx::query_as::<_, Post>(&query);
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

        let post = query_builder
            .fetch_optional(pool)
            .await
            .map_err(unique_violation("Slug already exists for this site"))?;

        Ok(post)
    }

    /// Delete a post.
    pub async fn delete(pool: &PgPool, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }
}
