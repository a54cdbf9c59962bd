use course_core::model::{LessonId, LessonProgress, UserId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_lesson_progress_row, storage_err};
use crate::repository::{LessonProgressRepository, StorageError};

#[async_trait::async_trait]
impl LessonProgressRepository for SqliteRepository {
    async fn get_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, lesson_id, duration_secs, is_completed, completed_at, updated_at
            FROM lesson_progress
            WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        row.as_ref().map(map_lesson_progress_row).transpose()
    }

    async fn list_lesson_progress(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LessonProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, lesson_id, duration_secs, is_completed, completed_at, updated_at
            FROM lesson_progress
            WHERE user_id = ?1
            ORDER BY lesson_id ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_lesson_progress_row(&row)?);
        }
        Ok(records)
    }

    async fn upsert_lesson_progress(&self, progress: &LessonProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_progress (
                user_id, lesson_id, duration_secs, is_completed, completed_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                duration_secs = excluded.duration_secs,
                is_completed = excluded.is_completed,
                completed_at = excluded.completed_at,
                updated_at = excluded.updated_at
            ",
        )
        .bind(progress.user_id().to_string())
        .bind(id_to_i64("lesson_id", progress.lesson_id().value())?)
        .bind(progress.duration_secs().map(i64::from))
        .bind(progress.is_completed())
        .bind(progress.completed_at())
        .bind(progress.updated_at())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn delete_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
            DELETE FROM lesson_progress
            WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_lesson_progress(&self, user_id: UserId) -> Result<u64, StorageError> {
        let result = sqlx::query(
            r"
            DELETE FROM lesson_progress
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
