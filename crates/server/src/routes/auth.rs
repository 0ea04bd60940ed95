//! Authentication routes: register, login, logout and the current-user probe.

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tower_sessions::Session;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::user::{CreateUser, Role, User};
use crate::routes::helpers::{MessageResponse, current_user};
use crate::state::AppState;

/// Session key for storing the authenticated user ID.
pub const SESSION_USER_ID: &str = "user_id";

/// Mailbox syntax check: local part, `@`, domain with at least one dot, no
/// whitespace anywhere.
///
/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex literal"));

/// Registration request body.
#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

/// Body for register and login responses.
#[derive(Debug, Serialize)]
struct AuthResponse {
    message: &'static str,
    user: User,
}

/// Body for the current-user probe.
#[derive(Debug, Serialize)]
struct MeResponse {
    user: Option<User>,
}

/// Registration handler.
///
/// POST /api/auth/register
/// - New accounts always start with the `user` role.
/// - Establishes a session for the new account.
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let name = request.name.as_deref().unwrap_or("").trim().to_string();
    let email = request.email.as_deref().unwrap_or("").trim().to_lowercase();
    let password = request.password.as_deref().unwrap_or("").trim().to_string();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Name, email and password are required.".to_string(),
        ));
    }

    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::BadRequest("Invalid email address.".to_string()));
    }

    let user = User::create(
        state.db(),
        CreateUser {
            name,
            email,
            password,
            role: Role::User,
        },
    )
    .await?;

    session
        .insert(SESSION_USER_ID, user.id)
        .await
        .context("failed to store session")?;

    info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registered successfully.",
            user,
        }),
    ))
}

/// Login handler.
///
/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = request.email.as_deref().unwrap_or("").trim().to_lowercase();
    let password = request.password.as_deref().unwrap_or("");

    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required.".to_string(),
        ));
    }

    // Unknown email and wrong password produce the same response.
    let Some(user) = User::find_by_email(state.db(), &email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if !user.verify_password(password) {
        return Err(AppError::InvalidCredentials);
    }

    session
        .insert(SESSION_USER_ID, user.id)
        .await
        .context("failed to store session")?;

    info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        message: "Logged in.",
        user,
    }))
}

/// Logout handler. Idempotent: succeeds with or without a session.
///
/// POST /api/auth/logout
async fn logout(session: Session) -> AppResult<Json<MessageResponse>> {
    session.delete().await.context("failed to delete session")?;

    Ok(Json(MessageResponse {
        message: "Logged out.",
    }))
}

/// Current-user probe. Requires no authentication; an anonymous caller gets
/// `{"user": null}`.
///
/// GET /api/auth/me
async fn me(State(state): State<AppState>, session: Session) -> AppResult<Json<MeResponse>> {
    let user = current_user(&state, &session).await?;

    Ok(Json(MeResponse { user }))
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}
