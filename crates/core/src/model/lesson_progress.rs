use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{LessonId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonProgressError {
    #[error("is_completed flag does not match completed_at")]
    CompletionMismatch,

    #[error("completed progress cannot accrue more time")]
    Completed,
}

/// Watched-time record for one learner on one lesson.
///
/// At most one record exists per `(user_id, lesson_id)` pair. A record with
/// `duration_secs == None` was completed without ever accruing time (untimed
/// lessons). Completion is terminal: once `is_completed` is set the duration
/// is frozen and further accrual is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgress {
    user_id: UserId,
    lesson_id: LessonId,
    duration_secs: Option<u32>,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl LessonProgress {
    /// Create the first in-progress record for a timed lesson.
    #[must_use]
    pub fn started(
        user_id: UserId,
        lesson_id: LessonId,
        duration_secs: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            duration_secs: Some(duration_secs),
            is_completed: false,
            completed_at: None,
            updated_at: now,
        }
    }

    /// Create a record that is completed from the outset.
    ///
    /// `duration_secs` is `None` for untimed lessons and the required
    /// duration when a timed lesson completes on its first submission.
    #[must_use]
    pub fn completed(
        user_id: UserId,
        lesson_id: LessonId,
        duration_secs: Option<u32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            lesson_id,
            duration_secs,
            is_completed: true,
            completed_at: Some(now),
            updated_at: now,
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `LessonProgressError::CompletionMismatch` if the completed
    /// flag and completion timestamp disagree.
    pub fn from_persisted(
        user_id: UserId,
        lesson_id: LessonId,
        duration_secs: Option<u32>,
        is_completed: bool,
        completed_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, LessonProgressError> {
        if is_completed != completed_at.is_some() {
            return Err(LessonProgressError::CompletionMismatch);
        }

        Ok(Self {
            user_id,
            lesson_id,
            duration_secs,
            is_completed,
            completed_at,
            updated_at,
        })
    }

    /// Replace the accrued duration on an in-progress record.
    ///
    /// # Errors
    ///
    /// Returns `LessonProgressError::Completed` if the record is already
    /// completed; completed durations are frozen.
    pub fn with_duration(
        self,
        duration_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, LessonProgressError> {
        if self.is_completed {
            return Err(LessonProgressError::Completed);
        }

        Ok(Self {
            duration_secs: Some(duration_secs),
            updated_at: now,
            ..self
        })
    }

    /// Transition the record to completed, freezing the duration.
    ///
    /// Completing an already-completed record is a no-op and returns the
    /// record unchanged, so repeat submissions cannot move `completed_at`.
    #[must_use]
    pub fn complete(self, duration_secs: Option<u32>, now: DateTime<Utc>) -> Self {
        if self.is_completed {
            return self;
        }

        Self {
            duration_secs,
            is_completed: true,
            completed_at: Some(now),
            updated_at: now,
            ..self
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn duration_secs(&self) -> Option<u32> {
        self.duration_secs
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn ids() -> (UserId, LessonId) {
        (UserId::random(), LessonId::new(7))
    }

    #[test]
    fn started_record_is_in_progress() {
        let (user, lesson) = ids();
        let progress = LessonProgress::started(user, lesson, 15, fixed_now());

        assert_eq!(progress.duration_secs(), Some(15));
        assert!(!progress.is_completed());
        assert!(progress.completed_at().is_none());
    }

    #[test]
    fn with_duration_updates_in_progress_record() {
        let (user, lesson) = ids();
        let later = fixed_now() + chrono::Duration::seconds(15);

        let progress = LessonProgress::started(user, lesson, 15, fixed_now())
            .with_duration(30, later)
            .unwrap();

        assert_eq!(progress.duration_secs(), Some(30));
        assert_eq!(progress.updated_at(), later);
    }

    #[test]
    fn with_duration_rejects_completed_record() {
        let (user, lesson) = ids();
        let progress = LessonProgress::completed(user, lesson, Some(120), fixed_now());

        let err = progress.with_duration(135, fixed_now()).unwrap_err();
        assert_eq!(err, LessonProgressError::Completed);
    }

    #[test]
    fn complete_freezes_duration_and_timestamp() {
        let (user, lesson) = ids();
        let first = fixed_now();
        let later = first + chrono::Duration::seconds(60);

        let progress = LessonProgress::started(user, lesson, 110, first)
            .complete(Some(120), first)
            .complete(Some(999), later);

        assert!(progress.is_completed());
        assert_eq!(progress.duration_secs(), Some(120));
        assert_eq!(progress.completed_at(), Some(first));
    }

    #[test]
    fn untimed_completion_keeps_duration_absent() {
        let (user, lesson) = ids();
        let progress = LessonProgress::completed(user, lesson, None, fixed_now());

        assert!(progress.is_completed());
        assert_eq!(progress.duration_secs(), None);
        assert_eq!(progress.completed_at(), Some(fixed_now()));
    }

    #[test]
    fn from_persisted_rejects_flag_mismatch() {
        let (user, lesson) = ids();

        let err = LessonProgress::from_persisted(user, lesson, Some(30), true, None, fixed_now())
            .unwrap_err();
        assert_eq!(err, LessonProgressError::CompletionMismatch);

        let err = LessonProgress::from_persisted(
            user,
            lesson,
            Some(30),
            false,
            Some(fixed_now()),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, LessonProgressError::CompletionMismatch);
    }

    #[test]
    fn from_persisted_roundtrips_completed_record() {
        let (user, lesson) = ids();
        let original = LessonProgress::completed(user, lesson, Some(120), fixed_now());

        let restored = LessonProgress::from_persisted(
            original.user_id(),
            original.lesson_id(),
            original.duration_secs(),
            original.is_completed(),
            original.completed_at(),
            original.updated_at(),
        )
        .unwrap();

        assert_eq!(restored, original);
    }
}
