//! Auth Error Types
//!
//! The closed error taxonomy of the core. Every domain failure is
//! classified into one of these variants at the point of detection and
//! converted to an HTTP response at a single boundary step.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// A single field validation failure.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Auth-specific error variants.
///
/// Unknown-email and wrong-password both map to `InvalidCredentials`;
/// missing, expired, and malformed tokens all map to `Unauthorized`.
/// The finer-grained cause is logged, never returned.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed shape validation (field-level detail attached)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Unknown email or wrong password; one message for both
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, expired, or malformed session token
    #[error("Not authorized")]
    Unauthorized,

    /// An identity with this email already exists
    #[error("User with this email already exists")]
    IdentityExists,

    /// Too many attempts within the configured window
    #[error("Too many attempts. Please try again later.")]
    RateLimited {
        /// Seconds until the window resets, when known
        retry_after_secs: Option<u64>,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::IdentityExists => StatusCode::CONFLICT,
            AuthError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials | AuthError::Unauthorized => ErrorKind::Unauthorized,
            AuthError::IdentityExists => ErrorKind::Conflict,
            AuthError::RateLimited { .. } => ErrorKind::TooManyRequests,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Message returned to the caller.
    ///
    /// Server faults return a fixed generic string; their detail goes to
    /// the operational log only (debug builds excepted).
    fn public_message(&self) -> String {
        match self {
            AuthError::Database(_) | AuthError::Internal(_) => {
                if cfg!(debug_assertions) {
                    self.to_string()
                } else {
                    "Internal Server Error".to_string()
                }
            }
            _ => self.to_string(),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RateLimited { retry_after_secs } => {
                tracing::warn!(?retry_after_secs, "Rate limit exceeded");
            }
            AuthError::Unauthorized => {
                tracing::warn!("Unauthorized access attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let mut body = serde_json::json!({
            "error": self.public_message(),
            "statusCode": status.as_u16(),
            "errorCode": self.kind().code(),
        });

        if let AuthError::Validation(details) = &self {
            body["details"] = serde_json::json!(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
