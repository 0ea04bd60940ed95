//! Template routes: public reads, admin-only mutation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::template::{CreateTemplate, Template, UpdateTemplate};
use crate::routes::helpers::{MessageResponse, deserialize_some, require_admin};
use crate::services::content::normalize_template_type;
use crate::state::AppState;

/// Create request body.
#[derive(Debug, Deserialize)]
struct CreateTemplateRequest {
    name: Option<String>,
    #[serde(rename = "type")]
    template_type: Option<String>,
    config: Option<serde_json::Value>,
}

/// Update request body. `config: null` clears the stored config.
#[derive(Debug, Deserialize)]
struct UpdateTemplateRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    name: Option<Option<String>>,
    #[serde(rename = "type", default, deserialize_with = "deserialize_some")]
    template_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    config: Option<Option<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct TemplatesResponse {
    templates: Vec<Template>,
}

#[derive(Debug, Serialize)]
struct TemplateResponse {
    template: Template,
}

#[derive(Debug, Serialize)]
struct TemplateMutationResponse {
    message: &'static str,
    template: Template,
}

/// List all templates, newest first.
///
/// GET /api/templates
async fn list_templates(State(state): State<AppState>) -> AppResult<Json<TemplatesResponse>> {
    let templates = Template::list(state.db()).await?;

    Ok(Json(TemplatesResponse { templates }))
}

/// Fetch one template.
///
/// GET /api/templates/{id}
async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TemplateResponse>> {
    let template = Template::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    Ok(Json(TemplateResponse { template }))
}

/// Create a template.
///
/// POST /api/templates (admin)
async fn create_template(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateTemplateRequest>,
) -> AppResult<(StatusCode, Json<TemplateMutationResponse>)> {
    let user = require_admin(&state, &session).await?;

    let name = request.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    // Kind defaults to `both`.
    let raw_type = request.template_type.as_deref().unwrap_or("").trim();
    let template_type = if raw_type.is_empty() {
        "both".to_string()
    } else {
        normalize_template_type(raw_type)?
    };

    let template = Template::create(
        state.db(),
        CreateTemplate {
            name,
            template_type,
            config: request.config,
            created_by_id: user.id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TemplateMutationResponse {
            message: "Template created",
            template,
        }),
    ))
}

/// Update a template. Only fields present in the request change.
///
/// PUT /api/templates/{id} (admin)
async fn update_template(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTemplateRequest>,
) -> AppResult<Json<TemplateMutationResponse>> {
    require_admin(&state, &session).await?;

    let template = Template::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    let mut patch = UpdateTemplate::default();

    if let Some(maybe_name) = request.name {
        let name = maybe_name.as_deref().unwrap_or("").trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest("Name cannot be empty".to_string()));
        }
        if Template::name_exists(state.db(), &name, Some(template.id)).await? {
            return Err(AppError::Conflict(
                "Template name already exists".to_string(),
            ));
        }
        patch.name = Some(name);
    }

    if let Some(maybe_type) = request.template_type {
        let template_type = normalize_template_type(maybe_type.as_deref().unwrap_or(""))?;
        patch.template_type = Some(template_type);
    }

    if let Some(config) = request.config {
        patch.config = Some(config);
    }

    let template = Template::update(state.db(), template.id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;

    Ok(Json(TemplateMutationResponse {
        message: "Template updated",
        template,
    }))
}

/// Delete a template. Content referencing it keeps existing with the
/// reference cleared.
///
/// DELETE /api/templates/{id} (admin)
async fn delete_template(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&state, &session).await?;

    let deleted = Template::delete(state.db(), id).await?;
    if !deleted {
        return Err(AppError::NotFound("Template not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Template deleted",
    }))
}

/// Create the template router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/templates", get(list_templates).post(create_template))
        .route(
            "/api/templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
}
