use async_trait::async_trait;
use thiserror::Error;

use course_core::model::LessonId;

/// Result of one progress submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Time was credited; the lesson is still in progress.
    Recorded { total_secs: u32 },
    /// This submission finished the lesson.
    Completed { total_secs: u32 },
    /// The server already holds a completed record. Stop submitting.
    AlreadyCompleted,
}

/// Saved progress fetched when a lesson page opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LessonSnapshot {
    pub saved_secs: Option<u32>,
    pub completed: bool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("server rejected the submission ({code}): {message}")]
    Rejected { code: String, message: String },
}

/// Transport the lesson tracker uses to talk to the progress API.
///
/// Implementations carry the learner's identity; the tracker only names the
/// lesson. Note that `submit_increment` sends no elapsed amount: the server
/// credits one configured interval per call.
#[async_trait]
pub trait ProgressSync: Send + Sync {
    async fn submit_increment(&self, lesson_id: LessonId) -> Result<SyncOutcome, SyncError>;

    async fn mark_complete(&self, lesson_id: LessonId) -> Result<SyncOutcome, SyncError>;

    async fn lesson_snapshot(&self, lesson_id: LessonId) -> Result<LessonSnapshot, SyncError>;
}
