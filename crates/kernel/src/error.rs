//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::services::UpdateError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),
}

/// Error object returned to API callers.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<UpdateError> for AppError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::Forbidden(_) => AppError::Forbidden("Not an allowed block type".to_string()),
            UpdateError::NotFound(_) => AppError::NotFound("No such post".to_string()),
            parse @ UpdateError::Parse { .. } => AppError::Unprocessable(parse.to_string()),
            transform @ UpdateError::InvalidTransform { .. } => {
                AppError::Internal(anyhow::Error::new(transform))
            }
            UpdateError::Storage(e) => AppError::Internal(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details are logged, never returned
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                code: status.as_u16(),
                message,
            }),
        )
            .into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content::ParseError;

    #[test]
    fn update_errors_map_to_statuses() {
        let forbidden = AppError::from(UpdateError::Forbidden("x/y".into()));
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(forbidden.to_string(), "Not an allowed block type");

        let missing = AppError::from(UpdateError::NotFound(999));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "No such post");

        let parse = AppError::from(UpdateError::Parse {
            post_id: 3,
            source: ParseError::Unclosed {
                name: "core/group".into(),
                offset: 0,
            },
        });
        assert_eq!(parse.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(parse.to_string().contains("post 3"));

        let transform = AppError::from(UpdateError::InvalidTransform {
            post_id: 3,
            block: "acme/hero".into(),
        });
        assert_eq!(transform.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let storage = AppError::from(UpdateError::Storage(anyhow::anyhow!("disk on fire")));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = AppError::Internal(anyhow::anyhow!("secret dsn")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
