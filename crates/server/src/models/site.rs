//! Site model and CRUD operations.
//!
//! A site is the tenant boundary: pages and posts belong to exactly one
//! site and their slugs are unique within it.

use crate::error::{AppResult, unique_violation};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Site record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_by_id: Uuid,
    pub config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new site.
#[derive(Debug)]
pub struct CreateSite {
    pub name: String,
    pub slug: String,
    pub created_by_id: Uuid,
    pub config: Option<serde_json::Value>,
}

/// Partial update. `config: Some(None)` clears the stored config.
#[derive(Debug, Default)]
pub struct UpdateSite {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub config: Option<Option<serde_json::Value>>,
}

impl Site {
    /// Find a site by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> AppResult<Option<Self>> {
        let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch site by id")?;

        Ok(site)
    }

    /// List all sites, newest first.
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Self>> {
        let sites =
            sqlx::query_as::<_, Site>("SELECT * FROM sites ORDER BY created_at DESC, id DESC")
                .fetch_all(pool)
                .await
                .context("failed to list sites")?;

        Ok(sites)
    }

    /// True when a site with this slug exists, optionally excluding one id.
    pub async fn slug_exists(pool: &PgPool, slug: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sites WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(pool)
        .await
        .context("failed to check site slug")?;

        Ok(exists)
    }

    /// Create a new site. A duplicate slug surfaces as `Conflict`.
    pub async fn create(pool: &PgPool, input: CreateSite) -> AppResult<Self> {
        let id = Uuid::now_v7();

        let site = sqlx::query_as::<_, Site>(
            r#"
            INSERT INTO sites (id, name, slug, created_by_id, config)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(input.created_by_id)
        .bind(&input.config)
        .fetch_one(pool)
        .await
        .map_err(unique_violation("Slug already exists"))?;

        Ok(site)
    }

    /// Update a site. Only fields present in the patch are touched.
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateSite) -> AppResult<Option<Self>> {
        // Build dynamic update query
        let mut query = String::from("UPDATE sites SET ");
        let mut params: Vec<String> = Vec::new();
        let mut param_idx = 1;

        if input.name.is_some() {
            params.push(format!("name = ${param_idx}"));
            param_idx += 1;
        }
        if input.slug.is_some() {
            params.push(format!("slug = ${param_idx}"));
            param_idx += 1;
        }
        if input.config.is_some() {
            params.push(format!("config = ${param_idx}"));
            param_idx += 1;
        }

        if params.is_empty() {
            // Nothing to update, just return the site
            return Self::find_by_id(pool, id).await;
        }

        params.push("updated_at = NOW()".to_string());
        query.push_str(&params.join(", "));
        query.push_str(&format!(" WHERE id = ${param_idx} RETURNING *"));

        let mut query_builder = sqlx::query_as::<_, Site>(&query);
        if let Some(ref name) = input.name {
            query_builder = query_builder.bind(name);
        }
        if let Some(ref slug) = input.slug {
            query_builder = query_builder.bind(slug);
        }
        if let Some(ref config) = input.config {
            query_builder = query_builder.bind(config);
        }
        query_builder = query_builder.bind(id);

        let site = query_builder
            .fetch_optional(pool)
            .await
            .map_err(unique_violation("Slug already exists"))?;

        Ok(site)
    }

    /// Delete a site. Its pages and posts cascade in the database.
    pub async fn delete(pool: &PgPool, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete site")?;

        Ok(result.rows_affected() > 0)
    }
}
