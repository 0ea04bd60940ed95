//! Shared route helpers: session guards and patch deserialization.

use serde::{Deserialize, Deserializer, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::routes::auth::SESSION_USER_ID;
use crate::state::AppState;

/// Resolve the session's user, if any.
///
/// A session pointing at a since-deleted user resolves to `None`.
pub async fn current_user(state: &AppState, session: &Session) -> AppResult<Option<User>> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();

    let Some(id) = user_id else {
        return Ok(None);
    };

    User::find_by_id(state.db(), id).await
}

/// Require an authenticated user.
///
/// Returns the [`User`] if one is logged in, `Unauthorized` otherwise.
pub async fn require_login(state: &AppState, session: &Session) -> AppResult<User> {
    current_user(state, session)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Require an authenticated **admin** user.
///
/// `Unauthorized` without a valid session, `Forbidden` for a non-admin.
pub async fn require_admin(state: &AppState, session: &Session) -> AppResult<User> {
    let user = require_login(state, session).await?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Body for endpoints that only report an outcome.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Deserializes a patch field so that explicit `null` stays distinguishable
/// from an absent field. Use on `Option<Option<T>>` fields together with
/// `#[serde(default, deserialize_with = "deserialize_some")]`: absent maps to
/// `None`, `null` to `Some(None)`, a value to `Some(Some(v))`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
