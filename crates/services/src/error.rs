//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{LessonId, LessonProgressError, QuizId};
use course_storage::repository::StorageError;

/// Errors emitted when loading course reference data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    /// The lesson is already completed; clients stop submitting on this.
    #[error("lesson {0} is already completed")]
    AlreadyCompleted(LessonId),

    #[error("lesson {0} has no required duration")]
    Untimed(LessonId),

    #[error("lesson {0} is not in the catalog")]
    UnknownLesson(LessonId),

    #[error(transparent)]
    Record(#[from] LessonProgressError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz {0} is not in the catalog")]
    UnknownQuiz(QuizId),

    #[error("score {score} is out of range 0..=100")]
    InvalidScore { score: u8 },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseViewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseViewError {
    #[error("course {0} is not in the catalog")]
    UnknownCourse(course_core::model::CourseId),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
