use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{QuizId, UserId};

/// Highest representable quiz score, in percent.
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizProgressError {
    #[error("score {score} is out of range 0..=100")]
    ScoreOutOfRange { score: u8 },
}

/// Latest quiz outcome for one learner on one quiz.
///
/// Unlike lesson completion, the pass flag is recomputed on every submission:
/// a retake that scores below the passing threshold flips `is_completed` back
/// to false. The record always holds the most recent attempt only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    user_id: UserId,
    quiz_id: QuizId,
    score: u8,
    is_completed: bool,
    updated_at: DateTime<Utc>,
}

impl QuizProgress {
    /// Record an attempt, deriving the pass flag from the passing threshold.
    ///
    /// A score equal to `passing_score` passes.
    #[must_use]
    pub fn record(
        user_id: UserId,
        quiz_id: QuizId,
        score: u8,
        passing_score: u8,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            quiz_id,
            score,
            is_completed: score >= passing_score,
            updated_at: now,
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizProgressError::ScoreOutOfRange` if the stored score
    /// exceeds 100.
    pub fn from_persisted(
        user_id: UserId,
        quiz_id: QuizId,
        score: u8,
        is_completed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, QuizProgressError> {
        if score > MAX_SCORE {
            return Err(QuizProgressError::ScoreOutOfRange { score });
        }

        Ok(Self {
            user_id,
            quiz_id,
            score,
            is_completed,
            updated_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn score(&self) -> u8 {
        self.score
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
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

    #[test]
    fn score_at_threshold_passes() {
        let progress =
            QuizProgress::record(UserId::random(), QuizId::new(1), 70, 70, fixed_now());
        assert!(progress.is_completed());
    }

    #[test]
    fn score_below_threshold_fails() {
        let progress =
            QuizProgress::record(UserId::random(), QuizId::new(1), 69, 70, fixed_now());
        assert!(!progress.is_completed());
    }

    #[test]
    fn retake_recomputes_pass_flag() {
        let user = UserId::random();
        let quiz = QuizId::new(1);

        let passed = QuizProgress::record(user, quiz, 85, 70, fixed_now());
        assert!(passed.is_completed());

        let retake = QuizProgress::record(user, quiz, 40, 70, fixed_now());
        assert!(!retake.is_completed());
        assert_eq!(retake.score(), 40);
    }

    #[test]
    fn from_persisted_rejects_overflowed_score() {
        let err =
            QuizProgress::from_persisted(UserId::random(), QuizId::new(1), 101, true, fixed_now())
                .unwrap_err();
        assert_eq!(err, QuizProgressError::ScoreOutOfRange { score: 101 });
    }
}
