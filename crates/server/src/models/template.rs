//! Template model and CRUD operations.

use crate::error::{AppResult, unique_violation};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Template record. The kind is `page`, `post` or `both`, validated at the
/// API boundary.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub template_type: String,
    pub config: Option<serde_json::Value>,
    pub created_by_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new template.
#[derive(Debug)]
pub struct CreateTemplate {
    pub name: String,
    pub template_type: String,
    pub config: Option<serde_json::Value>,
    pub created_by_id: Uuid,
}

/// Partial update. `config: Some(None)` clears the stored config.
#[derive(Debug, Default)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub template_type: Option<String>,
    pub config: Option<Option<serde_json::Value>>,
}

impl Template {
    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> AppResult<Option<Self>> {
        let template = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch template by id")?;

        Ok(template)
    }

    /// List all templates, newest first.
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Self>> {
        let templates = sqlx::query_as::<_, Template>(
            "SELECT * FROM templates ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(pool)
        .await
        .context("failed to list templates")?;

        Ok(templates)
    }

    /// True when a template with this name exists, optionally excluding one id.
    pub async fn name_exists(pool: &PgPool, name: &str, exclude: Option<Uuid>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM templates WHERE name = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(exclude)
        .fetch_one(pool)
        .await
        .context("failed to check template name")?;

        Ok(exists)
    }

    /// Create a new template. A duplicate name surfaces as `Conflict`.
    pub async fn create(pool: &PgPool, input: CreateTemplate) -> AppResult<Self> {
        let id = Uuid::now_v7();

        let template = sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates (id, name, type, config, created_by_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.template_type)
        .bind(&input.config)
        .bind(input.created_by_id)
        .fetch_one(pool)
        .await
        .map_err(unique_violation("Template name already exists"))?;

        Ok(template)
    }

    /// Update a template. Only fields present in the patch are touched.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: UpdateTemplate,
    ) -> AppResult<Option<Self>> {
        // Build dynamic update query
        let mut query = String::from("UPDATE templates SET ");
        let mut params: Vec<String> = Vec::new();
        let mut param_idx = 1;

        if input.name.is_some() {
            params.push(format!("name = ${param_idx}"));
            param_idx += 1;
        }
        if input.template_type.is_some() {
            params.push(format!("type = ${param_idx}"));
            param_idx += 1;
        }
        if input.config.is_some() {
            params.push(format!("config = ${param_idx}"));
            param_idx += 1;
        }

        if params.is_empty() {
            // Nothing to update, just return the template
            return Self::find_by_id(pool, id).await;
        }

        params.push("updated_at = NOW()".to_string());
        query.push_str(&params.join(", "));
        query.push_str(&format!(" WHERE id = ${param_idx} RETURNING *"));

        let mut query_builder = sqlx::query_as::<_, Template>(&query);
        if let Some(ref name) = input.name {
            query_builder = query_builder.bind(name);
        }
        if let Some(ref template_type) = input.template_type {
            query_builder = query_builder.bind(template_type);
        }
        if let Some(ref config) = input.config {
            query_builder = query_builder.bind(config);
        }
        query_builder = query_builder.bind(id);

        let template = query_builder
            .fetch_optional(pool)
            .await
            .map_err(unique_violation("Template name already exists"))?;

        Ok(template)
    }

    /// Delete a template. Pages and posts that referenced it keep existing;
    /// the database nulls their reference.
    pub async fn delete(pool: &PgPool, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete template")?;

        Ok(result.rows_affected() > 0)
    }
}
