use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use course_core::api::{ErrorBody, error_code};
use course_services::{CourseViewError, ProgressError, QuizError};
use course_storage::repository::StorageError;

/// API-level error, carrying the stable code each JSON error response uses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    AlreadyCompleted(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, error_code::VALIDATION, msg),
            ApiError::AlreadyCompleted(msg) => {
                (StatusCode::CONFLICT, error_code::ALREADY_COMPLETED, msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, error_code::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, error_code::CONFLICT, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, error_code::FORBIDDEN, msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_code::INTERNAL, msg)
            }
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

fn from_storage(err: StorageError) -> ApiError {
    match err {
        StorageError::NotFound => ApiError::NotFound("no progress record exists".to_string()),
        StorageError::Conflict => {
            ApiError::Conflict("a concurrent write changed this record".to_string())
        }
        other => {
            tracing::error!("storage failure: {other}");
            ApiError::Internal("storage unavailable".to_string())
        }
    }
}

impl From<ProgressError> for ApiError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::AlreadyCompleted(id) => {
                ApiError::AlreadyCompleted(format!("lesson {id} is already completed"))
            }
            ProgressError::Untimed(id) => {
                ApiError::Validation(format!("lesson {id} has no duration to increment"))
            }
            ProgressError::UnknownLesson(id) => {
                ApiError::NotFound(format!("lesson {id} does not exist"))
            }
            ProgressError::Storage(storage) => from_storage(storage),
            other => {
                tracing::error!("progress failure: {other}");
                ApiError::Internal("progress update failed".to_string())
            }
        }
    }
}

impl From<QuizError> for ApiError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::UnknownQuiz(id) => ApiError::NotFound(format!("quiz {id} does not exist")),
            QuizError::InvalidScore { score } => {
                ApiError::Validation(format!("score {score} is out of range 0..=100"))
            }
            QuizError::Storage(storage) => from_storage(storage),
            other => {
                tracing::error!("quiz failure: {other}");
                ApiError::Internal("quiz update failed".to_string())
            }
        }
    }
}

impl From<CourseViewError> for ApiError {
    fn from(err: CourseViewError) -> Self {
        match err {
            CourseViewError::UnknownCourse(id) => {
                ApiError::NotFound(format!("course {id} does not exist"))
            }
            other => {
                tracing::error!("course view failure: {other}");
                ApiError::Internal("course view unavailable".to_string())
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
