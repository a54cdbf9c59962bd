use async_trait::async_trait;
use course_core::model::{LessonId, LessonProgress, QuizId, QuizProgress, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for lesson watch-time records.
///
/// Records are keyed by `(user_id, lesson_id)`; an upsert of an existing key
/// replaces the whole record. Absence is a normal read outcome, not an error.
#[async_trait]
pub trait LessonProgressRepository: Send + Sync {
    /// Fetch one record, or `None` if the learner has not touched the lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError>;

    /// Fetch every lesson record for a learner, ordered by lesson id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn list_lesson_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LessonProgress>, StorageError>;

    /// Insert or replace the record for its `(user, lesson)` key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_lesson_progress(&self, progress: &LessonProgress) -> Result<(), StorageError>;

    /// Delete one record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record exists for the key.
    async fn delete_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<(), StorageError>;

    /// Delete every lesson record for a learner, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deletion fails.
    async fn delete_all_lesson_progress(&self, user_id: UserId) -> Result<u64, StorageError>;
}

/// Repository contract for quiz outcome records, keyed by `(user_id, quiz_id)`.
#[async_trait]
pub trait QuizProgressRepository: Send + Sync {
    /// Fetch one record, or `None` if the learner has not attempted the quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn get_quiz_progress(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Option<QuizProgress>, StorageError>;

    /// Fetch every quiz record for a learner, ordered by quiz id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lookup fails.
    async fn list_quiz_progress(&self, user_id: UserId) -> Result<Vec<QuizProgress>, StorageError>;

    /// Insert or replace the record for its `(user, quiz)` key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_quiz_progress(&self, progress: &QuizProgress) -> Result<(), StorageError>;

    /// Delete one record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no record exists for the key.
    async fn delete_quiz_progress(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<(), StorageError>;

    /// Delete every quiz record for a learner, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deletion fails.
    async fn delete_all_quiz_progress(&self, user_id: UserId) -> Result<u64, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<HashMap<(UserId, LessonId), LessonProgress>>>,
    quizzes: Arc<Mutex<HashMap<(UserId, QuizId), QuizProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lessons: Arc::new(Mutex::new(HashMap::new())),
            quizzes: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl LessonProgressRepository for InMemoryRepository {
    async fn get_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user_id, lesson_id)).cloned())
    }

    async fn list_lesson_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<LessonProgress> = guard
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .map(|(_, progress)| progress.clone())
            .collect();
        records.sort_by_key(LessonProgress::lesson_id);
        Ok(records)
    }

    async fn upsert_lesson_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((progress.user_id(), progress.lesson_id()), progress.clone());
        Ok(())
    }

    async fn delete_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .remove(&(user_id, lesson_id))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn delete_all_lesson_progress(&self, user_id: UserId) -> Result<u64, StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|(user, _), _| *user != user_id);
        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl QuizProgressRepository for InMemoryRepository {
    async fn get_quiz_progress(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Option<QuizProgress>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user_id, quiz_id)).cloned())
    }

    async fn list_quiz_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<QuizProgress>, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<QuizProgress> = guard
            .iter()
            .filter(|((user, _), _)| *user == user_id)
            .map(|(_, progress)| progress.clone())
            .collect();
        records.sort_by_key(QuizProgress::quiz_id);
        Ok(records)
    }

    async fn upsert_quiz_progress(&self, progress: &QuizProgress) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((progress.user_id(), progress.quiz_id()), progress.clone());
        Ok(())
    }

    async fn delete_quiz_progress(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .remove(&(user_id, quiz_id))
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn delete_all_quiz_progress(&self, user_id: UserId) -> Result<u64, StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|(user, _), _| *user != user_id);
        Ok((before - guard.len()) as u64)
    }
}

/// Aggregates progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonProgressRepository>,
    pub quizzes: Arc<dyn QuizProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let lessons: Arc<dyn LessonProgressRepository> = Arc::new(repo.clone());
        let quizzes: Arc<dyn QuizProgressRepository> = Arc::new(repo);
        Self { lessons, quizzes }
    }
}
