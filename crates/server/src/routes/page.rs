//! Page routes: public reads, admin-only mutation.
//!
//! The create path validates fields in a fixed order so callers see stable
//! error precedence; the update path walks request fields in declaration
//! order.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::page::{CreatePage, Page, UpdatePage};
use crate::models::{Site, Template};
use crate::routes::helpers::{MessageResponse, deserialize_some, require_admin};
use crate::services::content::{default_tree, normalize_status, validate_tree};
use crate::services::slug::slugify;
use crate::state::AppState;

/// Create request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePageRequest {
    site_id: Option<Uuid>,
    template_id: Option<Uuid>,
    title: Option<String>,
    slug: Option<String>,
    status: Option<String>,
    content: Option<serde_json::Value>,
}

/// Update request body. `templateId: null` clears the template reference;
/// other fields distinguish null from absent only to reject explicit nulls.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePageRequest {
    #[serde(default, deserialize_with = "deserialize_some")]
    title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    slug: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    template_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    status: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    content: Option<Option<serde_json::Value>>,
}

/// Query parameters for the listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPagesQuery {
    site_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
struct PagesResponse {
    pages: Vec<Page>,
}

#[derive(Debug, Serialize)]
struct PageResponse {
    page: Page,
}

#[derive(Debug, Serialize)]
struct PageMutationResponse {
    message: &'static str,
    page: Page,
}

/// List pages, newest first, optionally filtered by site.
///
/// GET /api/pages?siteId=…
async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<ListPagesQuery>,
) -> AppResult<Json<PagesResponse>> {
    let pages = Page::list(state.db(), query.site_id).await?;

    Ok(Json(PagesResponse { pages }))
}

/// Fetch one page.
///
/// GET /api/pages/{id}
async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PageResponse>> {
    let page = Page::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))?;

    Ok(Json(PageResponse { page }))
}

/// Fetch one page by its site-scoped slug. The slug segment is normalized
/// before lookup, so pretty and raw forms both resolve.
///
/// GET /api/pages/site/{site_id}/{slug}
async fn get_page_by_slug(
    State(state): State<AppState>,
    Path((site_id, slug)): Path<(Uuid, String)>,
) -> AppResult<Json<PageResponse>> {
    let page = Page::find_by_slug(state.db(), site_id, &slugify(&slug))
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))?;

    Ok(Json(PageResponse { page }))
}

/// Create a page.
///
/// POST /api/pages (admin)
async fn create_page(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreatePageRequest>,
) -> AppResult<(StatusCode, Json<PageMutationResponse>)> {
    let user = require_admin(&state, &session).await?;

    let Some(site_id) = request.site_id else {
        return Err(AppError::BadRequest("siteId is required".to_string()));
    };

    let title = request.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }

    let site = Site::find_by_id(state.db(), site_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Site not found".to_string()))?;

    // Slug defaults to the slugified title.
    let raw_slug = request.slug.as_deref().unwrap_or("").trim();
    let slug = if raw_slug.is_empty() {
        slugify(&title)
    } else {
        slugify(raw_slug)
    };
    if slug.is_empty() {
        return Err(AppError::BadRequest("Invalid slug".to_string()));
    }

    let raw_status = request.status.as_deref().unwrap_or("");
    let status = if raw_status.is_empty() {
        "draft".to_string()
    } else {
        normalize_status(raw_status)?
    };

    if let Some(template_id) = request.template_id {
        Template::find_by_id(state.db(), template_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
    }

    let content = match request.content {
        Some(content) => {
            validate_tree(&content)?;
            content
        }
        None => default_tree(),
    };

    let page = Page::create(
        state.db(),
        CreatePage {
            site_id: site.id,
            template_id: request.template_id,
            title,
            slug,
            content,
            status,
            created_by_id: user.id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PageMutationResponse {
            message: "Page created",
            page,
        }),
    ))
}

/// Update a page. Only fields present in the request change.
///
/// PUT /api/pages/{id} (admin)
async fn update_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePageRequest>,
) -> AppResult<Json<PageMutationResponse>> {
    require_admin(&state, &session).await?;

    let page = Page::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))?;

    let mut patch = UpdatePage::default();

    if let Some(maybe_title) = request.title {
        let title = maybe_title.as_deref().unwrap_or("").trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("title cannot be empty".to_string()));
        }
        patch.title = Some(title);
    }

    if let Some(maybe_slug) = request.slug {
        let candidate = slugify(maybe_slug.as_deref().unwrap_or(""));
        if candidate.is_empty() {
            return Err(AppError::BadRequest("Invalid slug".to_string()));
        }
        if Page::slug_exists(state.db(), page.site_id, &candidate, Some(page.id)).await? {
            return Err(AppError::Conflict(
                "Slug already exists for this site".to_string(),
            ));
        }
        patch.slug = Some(candidate);
    }

    if let Some(maybe_template) = request.template_id {
        match maybe_template {
            Some(template_id) => {
                Template::find_by_id(state.db(), template_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Template not found".to_string()))?;
                patch.template_id = Some(Some(template_id));
            }
            // Explicit null clears the reference.
            None => patch.template_id = Some(None),
        }
    }

    if let Some(maybe_status) = request.status {
        let status = normalize_status(maybe_status.as_deref().unwrap_or(""))?;
        patch.status = Some(status);
    }

    if let Some(maybe_content) = request.content {
        let content = maybe_content.unwrap_or(serde_json::Value::Null);
        validate_tree(&content)?;
        patch.content = Some(content);
    }

    let page = Page::update(state.db(), page.id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".to_string()))?;

    Ok(Json(PageMutationResponse {
        message: "Page updated",
        page,
    }))
}

/// Delete a page.
///
/// DELETE /api/pages/{id} (admin)
async fn delete_page(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&state, &session).await?;

    let deleted = Page::delete(state.db(), id).await?;
    if !deleted {
        return Err(AppError::NotFound("Page not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Page deleted",
    }))
}

/// Create the page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pages", get(list_pages).post(create_page))
        .route(
            "/api/pages/{id}",
            get(get_page).put(update_page).delete(delete_page),
        )
        .route("/api/pages/site/{site_id}/{slug}", get(get_page_by_slug))
}
