use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    #[diagnostic(code(coursework::validation))]
    Validation(String),

    #[error("Authentication required")]
    #[diagnostic(
        code(coursework::unauthenticated),
        help("Log in via POST /accounts/login and send the session cookie or a Bearer token")
    )]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    #[diagnostic(code(coursework::forbidden))]
    Forbidden(String),

    #[error("Not found: {0}")]
    #[diagnostic(code(coursework::not_found))]
    NotFound(String),

    #[error("Conflict: {0}")]
    #[diagnostic(code(coursework::conflict))]
    Conflict(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(coursework::internal))]
    Internal(String),

    #[error("Database error: {0}")]
    #[diagnostic(code(coursework::db))]
    Db(#[from] DbErr),

    #[error("I/O error: {0}")]
    #[diagnostic(code(coursework::io))]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    #[diagnostic(code(coursework::config))]
    Config(#[from] config::ConfigError),
}

impl AppError {
    /// Turns a store uniqueness violation into `Conflict`, leaving other
    /// database failures untouched.
    pub fn from_write(err: DbErr, conflict: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(conflict.into()),
            _ => AppError::Db(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Db(_) | AppError::Io(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            _ => "internal_error",
        }
    }
}

// Malformed bodies and path segments are client input errors like any other
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let description = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = json!({ "error": self.kind(), "error_description": description });
        (status, Json(body)).into_response()
    }
}
