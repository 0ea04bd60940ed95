//! Site routes: public reads, admin-only mutation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::site::{CreateSite, Site, UpdateSite};
use crate::routes::helpers::{MessageResponse, deserialize_some, require_admin};
use crate::services::slug::slugify;
use crate::state::AppState;

/// Create request body.
#[derive(Debug, Deserialize)]
struct CreateSiteRequest {
    name: Option<String>,
    slug: Option<String>,
    config: Option<serde_json::Value>,
}

/// Update request body. `config: null` clears the stored config; an empty or
/// null `name` leaves the name unchanged.
#[derive(Debug, Deserialize)]
struct UpdateSiteRequest {
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    slug: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    config: Option<Option<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct SitesResponse {
    sites: Vec<Site>,
}

#[derive(Debug, Serialize)]
struct SiteResponse {
    site: Site,
}

#[derive(Debug, Serialize)]
struct SiteMutationResponse {
    message: &'static str,
    site: Site,
}

/// List all sites, newest first.
///
/// GET /api/sites
async fn list_sites(State(state): State<AppState>) -> AppResult<Json<SitesResponse>> {
    let sites = Site::list(state.db()).await?;

    Ok(Json(SitesResponse { sites }))
}

/// Fetch one site.
///
/// GET /api/sites/{id}
async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SiteResponse>> {
    let site = Site::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Site not found".to_string()))?;

    Ok(Json(SiteResponse { site }))
}

/// Create a site.
///
/// POST /api/sites (admin)
async fn create_site(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateSiteRequest>,
) -> AppResult<(StatusCode, Json<SiteMutationResponse>)> {
    let user = require_admin(&state, &session).await?;

    let name = request.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    // Slug defaults to the slugified name.
    let raw_slug = request.slug.as_deref().unwrap_or("").trim();
    let slug = if raw_slug.is_empty() {
        slugify(&name)
    } else {
        slugify(raw_slug)
    };
    if slug.is_empty() {
        return Err(AppError::BadRequest("Invalid slug".to_string()));
    }

    let site = Site::create(
        state.db(),
        CreateSite {
            name,
            slug,
            created_by_id: user.id,
            config: request.config,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SiteMutationResponse {
            message: "Site created",
            site,
        }),
    ))
}

/// Update a site. Only fields present in the request change.
///
/// PUT /api/sites/{id} (admin)
async fn update_site(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSiteRequest>,
) -> AppResult<Json<SiteMutationResponse>> {
    require_admin(&state, &session).await?;

    let site = Site::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Site not found".to_string()))?;

    let mut patch = UpdateSite::default();

    // An empty name means "leave unchanged".
    if let Some(name) = request.name.as_deref() {
        let name = name.trim();
        if !name.is_empty() {
            patch.name = Some(name.to_string());
        }
    }

    if let Some(maybe_slug) = request.slug {
        let candidate = slugify(maybe_slug.as_deref().unwrap_or(""));
        if candidate.is_empty() {
            return Err(AppError::BadRequest("Invalid slug".to_string()));
        }
        if Site::slug_exists(state.db(), &candidate, Some(site.id)).await? {
            return Err(AppError::Conflict("Slug already exists".to_string()));
        }
        patch.slug = Some(candidate);
    }

    if let Some(config) = request.config {
        patch.config = Some(config);
    }

    let site = Site::update(state.db(), site.id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Site not found".to_string()))?;

    Ok(Json(SiteMutationResponse {
        message: "Site updated",
        site,
    }))
}

/// Delete a site. Its pages and posts go with it.
///
/// DELETE /api/sites/{id} (admin)
async fn delete_site(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    require_admin(&state, &session).await?;

    let deleted = Site::delete(state.db(), id).await?;
    if !deleted {
        return Err(AppError::NotFound("Site not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Site deleted",
    }))
}

/// Create the site router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sites", get(list_sites).post(create_site))
        .route(
            "/api/sites/{id}",
            get(get_site).put(update_site).delete(delete_site),
        )
}
