use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Application error type.
///
/// Every variant maps to one HTTP status and serializes as the
/// `{"error": <message>}` envelope the API speaks everywhere.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Internal server error. The underlying cause is logged, never surfaced.
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    /// Database error. Logged like `Internal`; unique-constraint violations
    /// should be translated to `Conflict` before reaching this variant.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Resource not found. Carries the caller-facing message.
    #[error("{0}")]
    NotFound(String),

    /// No valid session.
    #[error("Unauthorized")]
    Unauthorized,

    /// Login failure. Unknown email and wrong password are deliberately
    /// indistinguishable.
    #[error("Invalid credentials.")]
    InvalidCredentials,

    /// Valid session, insufficient rights.
    #[error("Forbidden")]
    Forbidden,

    /// Validation failure. Carries the caller-facing message.
    #[error("{0}")]
    BadRequest(String),

    /// Uniqueness violation. Carries the caller-facing message.
    #[error("{0}")]
    Conflict(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        // Log the real cause for 500s; the response body stays vague.
        match &self {
            AppError::Internal(e) => tracing::error!(error = ?e, "internal error"),
            AppError::Database(e) => tracing::error!(error = %e, "database error"),
            _ => {}
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Convenience alias for handler and model results.
pub type AppResult<T> = Result<T, AppError>;

/// Maps a unique-constraint violation to `Conflict` with the given message;
/// any other database error passes through unchanged.
pub fn unique_violation(message: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        other => AppError::Database(other),
    }
}
