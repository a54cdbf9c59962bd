//! Wire types shared between the HTTP API and its clients.
//!
//! Field names follow the web app's JSON conventions (camelCase), so these
//! types are the single source of truth for the request and response shapes
//! on both sides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Lesson, LessonProgress, QuizProgress};

/// Header carrying the authenticated user's id, set by the auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role, set by the auth proxy.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// What a progress submission asks the server to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitIntent {
    /// Complete the lesson directly (untimed lessons).
    MarkComplete,
    /// Credit one submit interval of watch time (timed lessons).
    IncrementDuration,
}

/// Body of `POST /api/progress`.
///
/// Deliberately carries no elapsed time: the server credits one configured
/// submit interval per request, so a tampered client cannot inflate its
/// watch time faster than real time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSubmission {
    pub lesson_id: u64,
    pub intent: SubmitIntent,
}

/// Lesson progress as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressBody {
    pub lesson_id: u64,
    pub duration_in_seconds: Option<u32>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&LessonProgress> for LessonProgressBody {
    fn from(progress: &LessonProgress) -> Self {
        Self {
            lesson_id: progress.lesson_id().value(),
            duration_in_seconds: progress.duration_secs(),
            is_completed: progress.is_completed(),
            completed_at: progress.completed_at(),
            updated_at: progress.updated_at(),
        }
    }
}

/// Quiz progress as rendered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizProgressBody {
    pub quiz_id: u64,
    pub score: u8,
    pub is_completed: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&QuizProgress> for QuizProgressBody {
    fn from(progress: &QuizProgress) -> Self {
        Self {
            quiz_id: progress.quiz_id().value(),
            score: progress.score(),
            is_completed: progress.is_completed(),
            updated_at: progress.updated_at(),
        }
    }
}

/// Response to a progress submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub progress: LessonProgressBody,
}

/// Lesson metadata as rendered to clients, from `GET /api/lessons/{id}`.
///
/// Clients size their timers from `requiredDurationInSeconds`; `null` marks
/// an untimed lesson that completes via mark-complete instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonBody {
    pub id: u64,
    pub slug: String,
    pub required_duration_in_seconds: Option<u32>,
}

impl From<&Lesson> for LessonBody {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id().value(),
            slug: lesson.slug().to_string(),
            required_duration_in_seconds: lesson.required_duration_secs(),
        }
    }
}

/// Body of `POST /api/quizzes/{id}/submit`: positional answer choices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<usize>,
}

/// Response to a quiz submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub progress: QuizProgressBody,
}

/// Response of `GET /api/progress`: everything the learner has touched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub lesson_progress: Vec<LessonProgressBody>,
    pub quiz_progress: Vec<QuizProgressBody>,
}

/// One entry of a course view, in course order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseItemBody {
    /// `"lesson"` or `"quiz"`.
    pub kind: String,
    pub id: u64,
    pub slug: String,
    /// `"locked"`, `"unstarted"`, `"in-progress"` or `"completed"`.
    pub status: String,
}

/// Response of `GET /api/courses/{id}/view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseViewBody {
    pub course_id: u64,
    pub slug: String,
    pub percent_complete: u8,
    pub items: Vec<CourseItemBody>,
}

/// Admin body assigning an explicit lesson duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDurationBody {
    pub duration_in_seconds: u32,
}

/// Admin body assigning an explicit quiz score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetScoreBody {
    pub score: u8,
}

/// Response to an admin reset, reporting how many records were removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetBody {
    pub removed: u64,
}

/// Uniform error payload for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, see [`error_code`].
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// Machine-readable error codes carried in [`ErrorBody::error`].
pub mod error_code {
    pub const VALIDATION: &str = "validation";
    pub const ALREADY_COMPLETED: &str = "already-completed";
    pub const NOT_FOUND: &str = "not-found";
    pub const CONFLICT: &str = "conflict";
    pub const FORBIDDEN: &str = "forbidden";
    pub const INTERNAL: &str = "internal";
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub module: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LessonId, UserId};
    use crate::time::fixed_now;

    #[test]
    fn submission_parses_kebab_case_intents() {
        let body: ProgressSubmission =
            serde_json::from_str(r#"{"lessonId": 7, "intent": "mark-complete"}"#).unwrap();
        assert_eq!(body.lesson_id, 7);
        assert_eq!(body.intent, SubmitIntent::MarkComplete);

        let body: ProgressSubmission =
            serde_json::from_str(r#"{"lessonId": 7, "intent": "increment-duration"}"#).unwrap();
        assert_eq!(body.intent, SubmitIntent::IncrementDuration);
    }

    #[test]
    fn unknown_intent_is_rejected() {
        let result =
            serde_json::from_str::<ProgressSubmission>(r#"{"lessonId": 7, "intent": "cheat"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn lesson_progress_serializes_with_camel_case_keys() {
        let progress = LessonProgress::started(UserId::random(), LessonId::new(3), 45, fixed_now());
        let json = serde_json::to_value(LessonProgressBody::from(&progress)).unwrap();

        assert_eq!(json["lessonId"], 3);
        assert_eq!(json["durationInSeconds"], 45);
        assert_eq!(json["isCompleted"], false);
        assert!(json["completedAt"].is_null());
    }

    #[test]
    fn snapshot_serializes_both_collections() {
        let snapshot = ProgressSnapshot {
            lesson_progress: Vec::new(),
            quiz_progress: Vec::new(),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["lessonProgress"].is_array());
        assert!(json["quizProgress"].is_array());
    }
}
