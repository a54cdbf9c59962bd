use chrono::{DateTime, Utc};
use std::sync::Arc;

use course_core::Clock;
use course_core::completion::{self, IncrementOutcome, SubmitPolicy};
use course_core::model::{Lesson, LessonId, LessonProgress, LessonProgressError, UserId};
use course_storage::repository::{LessonProgressRepository, StorageError};

use crate::catalog::CourseCatalog;
use crate::error::ProgressError;

/// Lesson progress orchestration: accrual, completion and admin overrides.
///
/// Every write follows the same shape: read the current record, run the pure
/// completion rules against the catalog's required duration, and upsert the
/// resulting record. A write that loses a race with a concurrent submission
/// is retried once against the fresh state.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    lessons: Arc<dyn LessonProgressRepository>,
    catalog: Arc<dyn CourseCatalog>,
    policy: SubmitPolicy,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonProgressRepository>,
        catalog: Arc<dyn CourseCatalog>,
    ) -> Self {
        Self {
            clock,
            lessons,
            catalog,
            policy: SubmitPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SubmitPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn policy(&self) -> SubmitPolicy {
        self.policy
    }

    /// Credit watch time reported by a client against a timed lesson.
    ///
    /// The elapsed amount is clamped to the submit policy's per-call maximum
    /// before it is added. Reaching the required duration completes the
    /// lesson at exactly that duration.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::AlreadyCompleted` once the lesson is done, so
    /// clients know to stop their timers. Returns `ProgressError::Untimed`
    /// for lessons without a required duration and
    /// `ProgressError::UnknownLesson` for ids missing from the catalog.
    pub async fn increment_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        elapsed_secs: u32,
    ) -> Result<LessonProgress, ProgressError> {
        let lesson = self.require_lesson(lesson_id).await?;
        let Some(required) = lesson.required_duration_secs() else {
            return Err(ProgressError::Untimed(lesson_id));
        };

        match self.increment_once(user_id, lesson_id, required, elapsed_secs).await {
            Err(ProgressError::Storage(StorageError::Conflict)) => {
                tracing::warn!(
                    "concurrent progress write for user {user_id} lesson {lesson_id}, retrying"
                );
                self.increment_once(user_id, lesson_id, required, elapsed_secs)
                    .await
            }
            other => other,
        }
    }

    /// Complete a lesson directly, the path used by untimed lessons.
    ///
    /// Completing an already-completed lesson is not an error; the existing
    /// record is returned unchanged so repeat submissions cannot move the
    /// completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownLesson` for ids missing from the
    /// catalog, or storage errors.
    pub async fn mark_complete(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<LessonProgress, ProgressError> {
        let lesson = self.require_lesson(lesson_id).await?;

        match self.mark_complete_once(user_id, &lesson).await {
            Err(ProgressError::Storage(StorageError::Conflict)) => {
                tracing::warn!(
                    "concurrent completion write for user {user_id} lesson {lesson_id}, retrying"
                );
                self.mark_complete_once(user_id, &lesson).await
            }
            other => other,
        }
    }

    /// Assign an explicit duration, the support-tooling override.
    ///
    /// Skips the per-submission clamp but still runs the completion ceiling,
    /// so the stored duration never exceeds the requirement.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::AlreadyCompleted` for completed lessons; those
    /// must be reset before their duration can change again. Untimed and
    /// unknown lessons error as for `increment_progress`.
    pub async fn set_duration(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        duration_secs: u32,
    ) -> Result<LessonProgress, ProgressError> {
        let lesson = self.require_lesson(lesson_id).await?;
        let Some(required) = lesson.required_duration_secs() else {
            return Err(ProgressError::Untimed(lesson_id));
        };

        match self
            .set_duration_once(user_id, lesson_id, required, duration_secs)
            .await
        {
            Err(ProgressError::Storage(StorageError::Conflict)) => {
                tracing::warn!(
                    "concurrent duration write for user {user_id} lesson {lesson_id}, retrying"
                );
                self.set_duration_once(user_id, lesson_id, required, duration_secs)
                    .await
            }
            other => other,
        }
    }

    /// Fetch one progress record; `None` means the lesson is not started.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn get_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, ProgressError> {
        Ok(self.lessons.get_lesson_progress(user_id, lesson_id).await?)
    }

    /// Fetch every lesson record for a learner.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn list_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LessonProgress>, ProgressError> {
        Ok(self.lessons.list_lesson_progress(user_id).await?)
    }

    /// Delete one progress record so the lesson can be taken fresh.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) if no record exists.
    pub async fn reset_lesson(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<(), ProgressError> {
        Ok(self
            .lessons
            .delete_lesson_progress(user_id, lesson_id)
            .await?)
    }

    /// Delete every lesson record for a learner, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn reset_all(&self, user_id: UserId) -> Result<u64, ProgressError> {
        Ok(self.lessons.delete_all_lesson_progress(user_id).await?)
    }

    async fn require_lesson(&self, lesson_id: LessonId) -> Result<Lesson, ProgressError> {
        self.catalog
            .lesson(lesson_id)
            .await?
            .ok_or(ProgressError::UnknownLesson(lesson_id))
    }

    async fn increment_once(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        required_secs: u32,
        elapsed_secs: u32,
    ) -> Result<LessonProgress, ProgressError> {
        let current = self.lessons.get_lesson_progress(user_id, lesson_id).await?;
        if current.as_ref().is_some_and(LessonProgress::is_completed) {
            return Err(ProgressError::AlreadyCompleted(lesson_id));
        }

        let outcome = completion::apply_increment(
            current.as_ref().and_then(LessonProgress::duration_secs),
            elapsed_secs,
            required_secs,
            &self.policy,
        );

        let next = materialize(current, outcome, user_id, lesson_id, self.clock.now())?;
        self.lessons.upsert_lesson_progress(&next).await?;
        Ok(next)
    }

    async fn mark_complete_once(
        &self,
        user_id: UserId,
        lesson: &Lesson,
    ) -> Result<LessonProgress, ProgressError> {
        let current = self
            .lessons
            .get_lesson_progress(user_id, lesson.id())
            .await?;
        if let Some(progress) = &current {
            if progress.is_completed() {
                return Ok(progress.clone());
            }
        }

        let now = self.clock.now();
        let next = match current {
            Some(progress) => progress.complete(lesson.required_duration_secs(), now),
            None => LessonProgress::completed(
                user_id,
                lesson.id(),
                lesson.required_duration_secs(),
                now,
            ),
        };

        self.lessons.upsert_lesson_progress(&next).await?;
        Ok(next)
    }

    async fn set_duration_once(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        required_secs: u32,
        duration_secs: u32,
    ) -> Result<LessonProgress, ProgressError> {
        let current = self.lessons.get_lesson_progress(user_id, lesson_id).await?;
        if current.as_ref().is_some_and(LessonProgress::is_completed) {
            return Err(ProgressError::AlreadyCompleted(lesson_id));
        }

        let outcome = completion::apply_explicit_duration(duration_secs, required_secs);
        let next = materialize(current, outcome, user_id, lesson_id, self.clock.now())?;
        self.lessons.upsert_lesson_progress(&next).await?;
        Ok(next)
    }
}

/// Turn a rules outcome into the record to persist.
fn materialize(
    current: Option<LessonProgress>,
    outcome: IncrementOutcome,
    user_id: UserId,
    lesson_id: LessonId,
    now: DateTime<Utc>,
) -> Result<LessonProgress, LessonProgressError> {
    Ok(match (current, outcome) {
        (Some(progress), IncrementOutcome::Partial { total_secs }) => {
            progress.with_duration(total_secs, now)?
        }
        (Some(progress), IncrementOutcome::Completed { total_secs }) => {
            progress.complete(Some(total_secs), now)
        }
        (None, IncrementOutcome::Partial { total_secs }) => {
            LessonProgress::started(user_id, lesson_id, total_secs, now)
        }
        (None, IncrementOutcome::Completed { total_secs }) => {
            LessonProgress::completed(user_id, lesson_id, Some(total_secs), now)
        }
    })
}
