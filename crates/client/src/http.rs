use async_trait::async_trait;
use reqwest::Client;

use course_core::api::{
    ErrorBody, LessonBody, ProgressResponse, ProgressSnapshot, ProgressSubmission, SubmitIntent,
    USER_ID_HEADER, error_code,
};
use course_core::model::{LessonId, UserId};

use crate::sync::{LessonSnapshot, ProgressSync, SyncError, SyncOutcome};

/// `ProgressSync` over HTTP against a running course server.
#[derive(Clone)]
pub struct HttpProgressClient {
    client: Client,
    base_url: String,
    user_id: UserId,
}

impl HttpProgressClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, user_id: UserId) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            user_id,
        }
    }

    /// Fetch a lesson's published metadata, `None` if it does not exist.
    ///
    /// Timers are sized from the server's required duration rather than
    /// anything stored locally.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on transport failures or a rejected request.
    pub async fn lesson(&self, lesson_id: LessonId) -> Result<Option<LessonBody>, SyncError> {
        let response = self
            .client
            .get(format!("{}/api/lessons/{}", self.base_url, lesson_id.value()))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error: ErrorBody = response.json().await.unwrap_or_else(|_| {
                ErrorBody::new(error_code::INTERNAL, format!("status {status}"))
            });
            return Err(SyncError::Rejected {
                code: error.error,
                message: error.message,
            });
        }

        Ok(Some(response.json().await?))
    }

    async fn submit(
        &self,
        lesson_id: LessonId,
        intent: SubmitIntent,
    ) -> Result<SyncOutcome, SyncError> {
        let payload = ProgressSubmission {
            lesson_id: lesson_id.value(),
            intent,
        };

        let response = self
            .client
            .post(format!("{}/api/progress", self.base_url))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: ProgressResponse = response.json().await?;
            let total_secs = body.progress.duration_in_seconds.unwrap_or(0);
            return Ok(if body.progress.is_completed {
                SyncOutcome::Completed { total_secs }
            } else {
                SyncOutcome::Recorded { total_secs }
            });
        }

        let error: ErrorBody = response
            .json()
            .await
            .unwrap_or_else(|_| ErrorBody::new(error_code::INTERNAL, format!("status {status}")));
        if error.error == error_code::ALREADY_COMPLETED {
            Ok(SyncOutcome::AlreadyCompleted)
        } else {
            Err(SyncError::Rejected {
                code: error.error,
                message: error.message,
            })
        }
    }
}

#[async_trait]
impl ProgressSync for HttpProgressClient {
    async fn submit_increment(&self, lesson_id: LessonId) -> Result<SyncOutcome, SyncError> {
        self.submit(lesson_id, SubmitIntent::IncrementDuration).await
    }

    async fn mark_complete(&self, lesson_id: LessonId) -> Result<SyncOutcome, SyncError> {
        self.submit(lesson_id, SubmitIntent::MarkComplete).await
    }

    async fn lesson_snapshot(&self, lesson_id: LessonId) -> Result<LessonSnapshot, SyncError> {
        let response = self
            .client
            .get(format!("{}/api/progress", self.base_url))
            .header(USER_ID_HEADER, self.user_id.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error: ErrorBody = response.json().await.unwrap_or_else(|_| {
                ErrorBody::new(error_code::INTERNAL, format!("status {status}"))
            });
            return Err(SyncError::Rejected {
                code: error.error,
                message: error.message,
            });
        }

        let snapshot: ProgressSnapshot = response.json().await?;
        Ok(snapshot
            .lesson_progress
            .iter()
            .find(|row| row.lesson_id == lesson_id.value())
            .map(|row| LessonSnapshot {
                saved_secs: row.duration_in_seconds,
                completed: row.is_completed,
            })
            .unwrap_or_default())
    }
}
