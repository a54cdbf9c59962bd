use course_core::model::{QuizId, QuizProgress, UserId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_quiz_progress_row, storage_err};
use crate::repository::{QuizProgressRepository, StorageError};

#[async_trait::async_trait]
impl QuizProgressRepository for SqliteRepository {
    async fn get_quiz_progress(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<Option<QuizProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, quiz_id, score, is_completed, updated_at
            FROM quiz_progress
            WHERE user_id = ?1 AND quiz_id = ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(id_to_i64("quiz_id", quiz_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.as_ref().map(map_quiz_progress_row).transpose()
    }

    async fn list_quiz_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<QuizProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, quiz_id, score, is_completed, updated_at
            FROM quiz_progress
            WHERE user_id = ?1
            ORDER BY quiz_id ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_quiz_progress_row(&row)?);
        }
        Ok(records)
    }

    async fn upsert_quiz_progress(&self, progress: &QuizProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_progress (user_id, quiz_id, score, is_completed, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, quiz_id) DO UPDATE SET
                score = excluded.score,
                is_completed = excluded.is_completed,
                updated_at = excluded.updated_at
            ",
        )
        .bind(progress.user_id().to_string())
        .bind(id_to_i64("quiz_id", progress.quiz_id().value())?)
        .bind(i64::from(progress.score()))
        .bind(progress.is_completed())
        .bind(progress.updated_at())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn delete_quiz_progress(
        &self,
        user_id: UserId,
        quiz_id: QuizId,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            DELETE FROM quiz_progress
            WHERE user_id = ?1 AND quiz_id = ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(id_to_i64("quiz_id", quiz_id.value())?)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_quiz_progress(&self, user_id: UserId) -> Result<u64, StorageError> {
        let result = sqlx::query(
            r"
            DELETE FROM quiz_progress
            WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(result.rows_affected())
    }
}
