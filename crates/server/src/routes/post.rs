//! Post routes: public reads, author-owned mutation.
//!
//! Any authenticated user can create a post and becomes its author. Updating
//! or deleting an existing post is limited to its author or an admin; that
//! check runs after the fetch, so a missing post is a 404 for everyone.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::post::{CreatePost, Post, PostFilters, UpdatePost};
use crate::models::{Site, Template, User};
use crate::routes::helpers::{MessageResponse, deserialize_some, require_login};
use crate::services::content::{default_tree, normalize_status, validate_tree};
use crate::services::slug::slugify;
use crate::state::AppState;

/// Create request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequest {
    site_id: Option<Uuid>,
    template_id: Option<Uuid>,
    title: Option<String>,
    slug: Option<String>,
    status: Option<String>,
    content: Option<serde_json::Value>,
}

/// Update request body. Same null handling as pages.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostRequest {
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

/// Query parameters for the listing. `status` is matched verbatim, so an
/// unknown value yields an empty list rather than an error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPostsQuery {
    site_id: Option<Uuid>,
    author_id: Option<Uuid>,
    status: Option<String>,
}

#[derive(Debug, Serialize)]
struct PostsResponse {
    posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
struct PostResponse {
    post: Post,
}

#[derive(Debug, Serialize)]
struct PostMutationResponse {
    message: &'static str,
    post: Post,
}

fn can_modify(user: &User, post: &Post) -> bool {
    user.is_admin() || post.author_id == user.id
}

/// List posts, newest first, with optional site, author and status filters.
///
/// GET /api/posts?siteId=…&authorId=…&status=…
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> AppResult<Json<PostsResponse>> {
    let posts = Post::list(
        state.db(),
        PostFilters {
            site_id: query.site_id,
            author_id: query.author_id,
            status: query.status,
        },
    )
    .await?;

    Ok(Json(PostsResponse { posts }))
}

/// Fetch one post.
///
/// GET /api/posts/{id}
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PostResponse>> {
    let post = Post::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(PostResponse { post }))
}

/// Fetch one post by its site-scoped slug. The slug segment is normalized
/// before lookup.
///
/// GET /api/posts/site/{site_id}/{slug}
async fn get_post_by_slug(
    State(state): State<AppState>,
    Path((site_id, slug)): Path<(Uuid, String)>,
) -> AppResult<Json<PostResponse>> {
    let post = Post::find_by_slug(state.db(), site_id, &slugify(&slug))
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(PostResponse { post }))
}

/// Create a post authored by the caller.
///
/// POST /api/posts (authenticated)
async fn create_post(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<PostMutationResponse>)> {
    let user = require_login(&state, &session).await?;

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

    let post = Post::create(
        state.db(),
        CreatePost {
            site_id: site.id,
            template_id: request.template_id,
            title,
            slug,
            content,
            status,
            author_id: user.id,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostMutationResponse {
            message: "Post created",
            post,
        }),
    ))
}

/// Update a post. Only fields present in the request change.
///
/// PUT /api/posts/{id} (author or admin)
async fn update_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePostRequest>,
) -> AppResult<Json<PostMutationResponse>> {
    let user = require_login(&state, &session).await?;

    let post = Post::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    if !can_modify(&user, &post) {
        return Err(AppError::Forbidden);
    }

    let mut patch = UpdatePost::default();

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
        if Post::slug_exists(state.db(), post.site_id, &candidate, Some(post.id)).await? {
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

    let post = Post::update(state.db(), post.id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(PostMutationResponse {
        message: "Post updated",
        post,
    }))
}

/// Delete a post.
///
/// DELETE /api/posts/{id} (author or admin)
async fn delete_post(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let user = require_login(&state, &session).await?;

    let post = Post::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
    if !can_modify(&user, &post) {
        return Err(AppError::Forbidden);
    }

    Post::delete(state.db(), post.id).await?;

    Ok(Json(MessageResponse {
        message: "Post deleted",
    }))
}

/// Create the post router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/site/{site_id}/{slug}", get(get_post_by_slug))
}
