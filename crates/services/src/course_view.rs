use std::collections::HashMap;
use std::sync::Arc;

use course_core::model::{CourseId, CourseItem, LessonId, LessonProgress, QuizId, QuizProgress, UserId};
use course_core::rollup::{self, ItemSnapshot, ItemStatus};
use course_storage::repository::{LessonProgressRepository, QuizProgressRepository};

use crate::catalog::CourseCatalog;
use crate::error::CourseViewError;

/// Presentation-agnostic course outline entry.
///
/// The slug comes from the catalog, the status from the learner's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseItemView {
    pub item: CourseItem,
    pub slug: String,
    pub status: ItemStatus,
}

/// One learner's rolled-up view of a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseView {
    pub course_id: CourseId,
    pub slug: String,
    pub percent_complete: u8,
    pub items: Vec<CourseItemView>,
}

/// Read-side assembly of catalog content and per-learner progress.
///
/// Progress reads are best-effort: if a repository is unavailable the view
/// still renders, with the affected items shown as unstarted. Only a missing
/// course or an unreachable catalog fails the whole view.
#[derive(Clone)]
pub struct CourseViewService {
    lessons: Arc<dyn LessonProgressRepository>,
    quizzes: Arc<dyn QuizProgressRepository>,
    catalog: Arc<dyn CourseCatalog>,
}

impl CourseViewService {
    #[must_use]
    pub fn new(
        lessons: Arc<dyn LessonProgressRepository>,
        quizzes: Arc<dyn QuizProgressRepository>,
        catalog: Arc<dyn CourseCatalog>,
    ) -> Self {
        Self {
            lessons,
            quizzes,
            catalog,
        }
    }

    /// Assemble the outline, per-item statuses and overall percentage for
    /// one learner on one course.
    ///
    /// Items the course lists but the catalog no longer carries are dropped
    /// from the view after a warning rather than failing it.
    ///
    /// # Errors
    ///
    /// Returns `CourseViewError::UnknownCourse` for ids missing from the
    /// catalog and `CourseViewError::Catalog` when the catalog itself is
    /// unavailable.
    pub async fn course_view(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<CourseView, CourseViewError> {
        let course = self
            .catalog
            .course(course_id)
            .await?
            .ok_or(CourseViewError::UnknownCourse(course_id))?;

        let lesson_rows = self.lesson_rows(user_id).await;
        let quiz_rows = self.quiz_rows(user_id).await;

        let mut entries: Vec<(CourseItem, String)> = Vec::with_capacity(course.items().len());
        let mut snapshots: Vec<ItemSnapshot> = Vec::with_capacity(course.items().len());

        for item in course.items() {
            match *item {
                CourseItem::Lesson(lesson_id) => {
                    let Some(lesson) = self.catalog.lesson(lesson_id).await? else {
                        tracing::warn!(
                            "course {course_id} lists lesson {lesson_id} missing from the catalog"
                        );
                        continue;
                    };
                    let row = lesson_rows.get(&lesson_id);
                    entries.push((*item, lesson.slug().to_string()));
                    snapshots.push(ItemSnapshot {
                        required_secs: lesson.required_duration_secs(),
                        saved_secs: row.and_then(|p| p.duration_secs()),
                        started: row.is_some(),
                        completed: row.is_some_and(|p| p.is_completed()),
                    });
                }
                CourseItem::Quiz(quiz_id) => {
                    let Some(quiz) = self.catalog.quiz(quiz_id).await? else {
                        tracing::warn!(
                            "course {course_id} lists quiz {quiz_id} missing from the catalog"
                        );
                        continue;
                    };
                    let row = quiz_rows.get(&quiz_id);
                    entries.push((*item, quiz.slug().to_string()));
                    snapshots.push(ItemSnapshot {
                        required_secs: None,
                        saved_secs: None,
                        started: row.is_some(),
                        completed: row.is_some_and(|p| p.is_completed()),
                    });
                }
            }
        }

        let statuses = rollup::item_statuses(&snapshots);
        let percent_complete = rollup::percent_complete(&snapshots);

        let items = entries
            .into_iter()
            .zip(statuses)
            .map(|((item, slug), status)| CourseItemView { item, slug, status })
            .collect();

        Ok(CourseView {
            course_id: course.id(),
            slug: course.slug().to_string(),
            percent_complete,
            items,
        })
    }

    async fn lesson_rows(&self, user_id: UserId) -> HashMap<LessonId, LessonProgress> {
        match self.lessons.list_lesson_progress(user_id).await {
            Ok(rows) => rows.into_iter().map(|p| (p.lesson_id(), p)).collect(),
            Err(err) => {
                tracing::warn!("lesson progress unavailable for user {user_id}: {err}");
                HashMap::new()
            }
        }
    }

    async fn quiz_rows(&self, user_id: UserId) -> HashMap<QuizId, QuizProgress> {
        match self.quizzes.list_quiz_progress(user_id).await {
            Ok(rows) => rows.into_iter().map(|p| (p.quiz_id(), p)).collect(),
            Err(err) => {
                tracing::warn!("quiz progress unavailable for user {user_id}: {err}");
                HashMap::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::progress_service::ProgressService;
    use crate::quiz_service::QuizService;
    use async_trait::async_trait;
    use course_core::time::fixed_clock;
    use course_storage::repository::{InMemoryRepository, StorageError};

    // sample course 1: lessons 1 (120s) and 2 (300s), quiz 1, lesson 3 (untimed)
    fn services() -> (CourseViewService, ProgressService, QuizService) {
        let repo = InMemoryRepository::new();
        let catalog = Arc::new(StaticCatalog::sample());
        let views = CourseViewService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            catalog.clone(),
        );
        let progress =
            ProgressService::new(fixed_clock(), Arc::new(repo.clone()), catalog.clone());
        let quizzes = QuizService::new(fixed_clock(), Arc::new(repo), catalog);
        (views, progress, quizzes)
    }

    #[tokio::test]
    async fn fresh_course_shows_first_item_unstarted_and_rest_locked() {
        let (views, _, _) = services();
        let view = views
            .course_view(UserId::random(), CourseId::new(1))
            .await
            .unwrap();

        assert_eq!(view.slug, "intro-course");
        assert_eq!(view.percent_complete, 0);
        let statuses: Vec<ItemStatus> = view.items.iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Unstarted,
                ItemStatus::Locked,
                ItemStatus::Locked,
                ItemStatus::Locked
            ]
        );
    }

    #[tokio::test]
    async fn partial_progress_unlocks_the_next_item_only() {
        let (views, progress, _) = services();
        let user = UserId::random();

        progress.mark_complete(user, LessonId::new(1)).await.unwrap();
        progress
            .set_duration(user, LessonId::new(2), 130)
            .await
            .unwrap();

        let view = views.course_view(user, CourseId::new(1)).await.unwrap();
        let statuses: Vec<ItemStatus> = view.items.iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![
                ItemStatus::Completed,
                ItemStatus::InProgress,
                ItemStatus::Locked,
                ItemStatus::Locked
            ]
        );
        // timed lessons only: (120 + 130) of (120 + 300), rounded up
        assert_eq!(view.percent_complete, 60);
    }

    #[tokio::test]
    async fn finished_course_reports_one_hundred_percent() {
        let (views, progress, quizzes) = services();
        let user = UserId::random();

        progress.mark_complete(user, LessonId::new(1)).await.unwrap();
        progress.mark_complete(user, LessonId::new(2)).await.unwrap();
        quizzes.submit(user, QuizId::new(1), &[0, 1]).await.unwrap();
        progress.mark_complete(user, LessonId::new(3)).await.unwrap();

        let view = views.course_view(user, CourseId::new(1)).await.unwrap();
        assert_eq!(view.percent_complete, 100);
        assert!(view.items.iter().all(|i| i.status == ItemStatus::Completed));
    }

    #[tokio::test]
    async fn unknown_course_is_rejected() {
        let (views, _, _) = services();
        let err = views
            .course_view(UserId::random(), CourseId::new(999))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseViewError::UnknownCourse(_)));
    }

    #[tokio::test]
    async fn items_missing_from_the_catalog_are_dropped() {
        use course_core::model::Course;

        let course = Course::new(
            CourseId::new(7),
            "ghost-course",
            vec![
                CourseItem::Lesson(LessonId::new(50)),
                CourseItem::Quiz(QuizId::new(50)),
            ],
        )
        .unwrap();
        let catalog = StaticCatalog::new(Vec::new(), Vec::new(), vec![course]);
        let repo = InMemoryRepository::new();
        let views = CourseViewService::new(
            Arc::new(repo.clone()),
            Arc::new(repo),
            Arc::new(catalog),
        );

        let view = views
            .course_view(UserId::random(), CourseId::new(7))
            .await
            .unwrap();
        assert!(view.items.is_empty());
        assert_eq!(view.percent_complete, 0);
    }

    struct FailingRepository;

    #[async_trait]
    impl LessonProgressRepository for FailingRepository {
        async fn get_lesson_progress(
            &self,
            _user_id: UserId,
            _lesson_id: LessonId,
        ) -> Result<Option<LessonProgress>, StorageError> {
            Err(StorageError::Connection("down".to_string()))
        }

        async fn list_lesson_progress(
            &self,
            _user_id: UserId,
        ) -> Result<Vec<LessonProgress>, StorageError> {
            Err(StorageError::Connection("down".to_string()))
        }

        async fn upsert_lesson_progress(
            &self,
            _progress: &LessonProgress,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("down".to_string()))
        }

        async fn delete_lesson_progress(
            &self,
            _user_id: UserId,
            _lesson_id: LessonId,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("down".to_string()))
        }

        async fn delete_all_lesson_progress(&self, _user_id: UserId) -> Result<u64, StorageError> {
            Err(StorageError::Connection("down".to_string()))
        }
    }

    #[tokio::test]
    async fn view_still_renders_when_progress_reads_fail() {
        let quizzes = InMemoryRepository::new();
        let views = CourseViewService::new(
            Arc::new(FailingRepository),
            Arc::new(quizzes),
            Arc::new(StaticCatalog::sample()),
        );

        let view = views
            .course_view(UserId::random(), CourseId::new(1))
            .await
            .unwrap();
        assert_eq!(view.items.len(), 4);
        assert_eq!(view.percent_complete, 0);
        assert_eq!(view.items[0].status, ItemStatus::Unstarted);
    }
}
