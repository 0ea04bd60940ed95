//! Administration routes: dashboard overview and user management.

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::user::UserFilters;
use crate::models::{Role, User};
use crate::routes::helpers::require_admin;
use crate::services::overview::Overview;
use crate::state::AppState;

/// Query parameters for the user listing. An unrecognized `role` value is
/// ignored rather than rejected.
#[derive(Debug, Deserialize)]
struct ListUsersQuery {
    q: Option<String>,
    role: Option<String>,
    sort: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleUpdateRequest {
    role: Option<String>,
}

#[derive(Debug, Serialize)]
struct UsersResponse {
    users: Vec<User>,
}

#[derive(Debug, Serialize)]
struct RoleUpdateResponse {
    message: &'static str,
    user: User,
}

/// The dashboard rollup.
///
/// GET /api/admin/overview (admin)
async fn overview(State(state): State<AppState>, session: Session) -> AppResult<Json<Overview>> {
    require_admin(&state, &session).await?;

    let overview = Overview::load(state.db()).await?;

    Ok(Json(overview))
}

/// List users with optional search, role filter and ordering.
///
/// GET /api/admin/users?q=…&role=…&sort=… (admin)
async fn list_users(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<UsersResponse>> {
    require_admin(&state, &session).await?;

    let users = User::search(
        state.db(),
        UserFilters {
            q: query.q,
            role: query.role.as_deref().and_then(Role::parse),
            sort: query.sort,
        },
    )
    .await?;

    Ok(Json(UsersResponse { users }))
}

/// Change a user's role.
///
/// PUT /api/admin/users/{id}/role (admin)
async fn update_user_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<RoleUpdateRequest>,
) -> AppResult<Json<RoleUpdateResponse>> {
    let caller = require_admin(&state, &session).await?;

    let target = User::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let Some(role) = Role::parse(request.role.as_deref().unwrap_or("")) else {
        return Err(AppError::BadRequest(
            "Invalid role. Allowed: admin, user".to_string(),
        ));
    };

    // An admin cannot demote their own account.
    if target.id == caller.id && role != Role::Admin {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role.".to_string(),
        ));
    }

    let user = User::set_role(state.db(), target.id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(RoleUpdateResponse {
        message: "Role updated",
        user,
    }))
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/overview", get(overview))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/role", put(update_user_role))
}
