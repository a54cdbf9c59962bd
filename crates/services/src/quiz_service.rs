use std::sync::Arc;

use course_core::Clock;
use course_core::model::{MAX_SCORE, Quiz, QuizId, QuizProgress, UserId};
use course_storage::repository::QuizProgressRepository;

use crate::catalog::CourseCatalog;
use crate::error::QuizError;

/// Quiz grading and attempt tracking.
///
/// Each submission replaces the previous attempt wholesale, and the pass
/// flag is recomputed from the new score every time. Passing a quiz is not
/// sticky the way lesson completion is.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    quizzes: Arc<dyn QuizProgressRepository>,
    catalog: Arc<dyn CourseCatalog>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quizzes: Arc<dyn QuizProgressRepository>,
        catalog: Arc<dyn CourseCatalog>,
    ) -> Self {
        Self {
            clock,
            quizzes,
            catalog,
        }
    }

    /// Grade a set of answers and store the attempt.
    ///
    /// Answers are matched to questions by position; missing or out-of-range
    /// answers count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownQuiz` for ids missing from the catalog, or
    /// storage errors.
    pub async fn submit(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        answers: &[usize],
    ) -> Result<QuizProgress, QuizError> {
        let quiz = self.require_quiz(quiz_id).await?;
        let score = quiz.grade(answers);
        self.store_attempt(user_id, &quiz, score).await
    }

    /// Overwrite the stored score, the support-tooling override.
    ///
    /// The pass flag is rederived from the catalog's passing threshold, same
    /// as for a graded submission.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidScore` for scores over 100,
    /// `QuizError::UnknownQuiz` for ids missing from the catalog, or storage
    /// errors.
    pub async fn set_score(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
        score: u8,
    ) -> Result<QuizProgress, QuizError> {
        if score > MAX_SCORE {
            return Err(QuizError::InvalidScore { score });
        }
        let quiz = self.require_quiz(quiz_id).await?;
        self.store_attempt(user_id, &quiz, score).await
    }

    /// Force a quiz into the passed state without lowering a better score.
    ///
    /// A learner already above the threshold keeps their score; anyone else
    /// is raised to exactly the passing score.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownQuiz` for ids missing from the catalog, or
    /// storage errors.
    pub async fn complete_quiz(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<QuizProgress, QuizError> {
        let quiz = self.require_quiz(quiz_id).await?;
        let current = self
            .quizzes
            .get_quiz_progress(user_id, quiz_id)
            .await?
            .map_or(0, |progress| progress.score());
        let score = current.max(quiz.passing_score());
        self.store_attempt(user_id, &quiz, score).await
    }

    /// Fetch one quiz record; `None` means the quiz was never attempted.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn get_progress(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Option<QuizProgress>, QuizError> {
        Ok(self.quizzes.get_quiz_progress(user_id, quiz_id).await?)
    }

    /// Fetch every quiz record for a learner.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn list_progress(&self, user_id: UserId) -> Result<Vec<QuizProgress>, QuizError> {
        Ok(self.quizzes.list_quiz_progress(user_id).await?)
    }

    /// Delete one quiz record so the quiz can be retaken from scratch.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) if no record exists.
    pub async fn reset_quiz(&self, user_id: UserId, quiz_id: QuizId) -> Result<(), QuizError> {
        Ok(self.quizzes.delete_quiz_progress(user_id, quiz_id).await?)
    }

    /// Delete every quiz record for a learner, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn reset_all(&self, user_id: UserId) -> Result<u64, QuizError> {
        Ok(self.quizzes.delete_all_quiz_progress(user_id).await?)
    }

    async fn require_quiz(&self, quiz_id: QuizId) -> Result<Quiz, QuizError> {
        self.catalog
            .quiz(quiz_id)
            .await?
            .ok_or(QuizError::UnknownQuiz(quiz_id))
    }

    async fn store_attempt(
        &self,
        user_id: UserId,
        quiz: &Quiz,
        score: u8,
    ) -> Result<QuizProgress, QuizError> {
        let attempt = QuizProgress::record(
            user_id,
            quiz.id(),
            score,
            quiz.passing_score(),
            self.clock.now(),
        );
        self.quizzes.upsert_quiz_progress(&attempt).await?;
        Ok(attempt)
    }
}
