//! Request-level errors and their HTTP rendering (RFC 7807 problem bodies).

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::{password::PasswordError, permissions::GateError, repository::RepoError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden")]
    Forbidden,

    #[error("unauthorized")]
    Unauthorized,

    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Send the client elsewhere with `303 See Other`.
    #[error("redirect to {0}")]
    Redirect(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// ErrorBody
///
/// Problem details returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Redirect(_) => StatusCode::SEE_OTHER,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }

    /// Maps a gate refusal onto a redirect to `location`.
    pub fn redirect_on_denial(err: GateError, resource: &'static str, location: String) -> Self {
        match err {
            GateError::NotFound => AppError::NotFound(resource),
            GateError::NotAuthor => AppError::Redirect(location),
        }
    }

    /// Maps a gate refusal onto `403 Forbidden`.
    pub fn forbid_on_denial(err: GateError, resource: &'static str) -> Self {
        match err {
            GateError::NotFound => AppError::NotFound(resource),
            GateError::NotAuthor => AppError::Forbidden,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let AppError::Redirect(location) = &self {
            return (status, [(header::LOCATION, location.clone())]).into_response();
        }

        let detail = match &self {
            AppError::Internal(detail) => {
                // Never leak internals to the client.
                tracing::error!("internal error: {}", detail);
                None
            }
            AppError::NotFound(_) | AppError::Validation(_) | AppError::Conflict(_) => {
                Some(self.to_string())
            }
            _ => None,
        };

        let body = ErrorBody {
            error_type: "about:blank".to_string(),
            title: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            status: status.as_u16(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => AppError::Conflict(msg),
            RepoError::InvalidReference(msg) => AppError::invalid(msg),
            RepoError::Database(e) => AppError::Internal(format!("database: {e}")),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}
