use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use course_core::model::{
    Course, CourseId, CourseItem, Lesson, LessonId, Quiz, QuizId, QuizQuestion,
};

use crate::error::CatalogError;

/// Read-only source of course reference data.
///
/// Progress services consult the catalog for required durations and passing
/// scores; they never write to it. Implementations may sit in front of a CMS,
/// hence the async contract and the failure mode.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    /// Look up a lesson definition.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog cannot be reached.
    async fn lesson(&self, id: LessonId) -> Result<Option<Lesson>, CatalogError>;

    /// Look up a quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog cannot be reached.
    async fn quiz(&self, id: QuizId) -> Result<Option<Quiz>, CatalogError>;

    /// Look up a course definition.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog cannot be reached.
    async fn course(&self, id: CourseId) -> Result<Option<Course>, CatalogError>;
}

/// Catalog held fully in memory, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    lessons: Arc<HashMap<LessonId, Lesson>>,
    quizzes: Arc<HashMap<QuizId, Quiz>>,
    courses: Arc<HashMap<CourseId, Course>>,
}

impl StaticCatalog {
    #[must_use]
    pub fn new(lessons: Vec<Lesson>, quizzes: Vec<Quiz>, courses: Vec<Course>) -> Self {
        Self {
            lessons: Arc::new(lessons.into_iter().map(|l| (l.id(), l)).collect()),
            quizzes: Arc::new(quizzes.into_iter().map(|q| (q.id(), q)).collect()),
            courses: Arc::new(courses.into_iter().map(|c| (c.id(), c)).collect()),
        }
    }

    /// Small built-in catalog used by the demo commands and tests: two timed
    /// lessons, one untimed lesson and a quiz, arranged as one course.
    ///
    /// # Panics
    ///
    /// Panics only if the hardcoded definitions are invalid, which is a bug.
    #[must_use]
    pub fn sample() -> Self {
        let lessons = vec![
            Lesson::new(LessonId::new(1), "getting-started", Some(120)).expect("valid lesson"),
            Lesson::new(LessonId::new(2), "first-project", Some(300)).expect("valid lesson"),
            Lesson::new(LessonId::new(3), "further-reading", None).expect("valid lesson"),
        ];

        let questions = vec![
            QuizQuestion::new(
                "Which file declares a package's dependencies?",
                vec![
                    "Cargo.toml".to_string(),
                    "main.rs".to_string(),
                    "lib.rs".to_string(),
                ],
                0,
            )
            .expect("valid question"),
            QuizQuestion::new(
                "What does `cargo build` produce by default?",
                vec![
                    "a release binary".to_string(),
                    "a debug binary".to_string(),
                ],
                1,
            )
            .expect("valid question"),
        ];
        let quizzes = vec![
            Quiz::new(QuizId::new(1), "basics-check", 50, questions).expect("valid quiz"),
        ];

        let courses = vec![
            Course::new(
                CourseId::new(1),
                "intro-course",
                vec![
                    CourseItem::Lesson(LessonId::new(1)),
                    CourseItem::Lesson(LessonId::new(2)),
                    CourseItem::Quiz(QuizId::new(1)),
                    CourseItem::Lesson(LessonId::new(3)),
                ],
            )
            .expect("valid course"),
        ];

        Self::new(lessons, quizzes, courses)
    }
}

#[async_trait]
impl CourseCatalog for StaticCatalog {
    async fn lesson(&self, id: LessonId) -> Result<Option<Lesson>, CatalogError> {
        Ok(self.lessons.get(&id).cloned())
    }

    async fn quiz(&self, id: QuizId) -> Result<Option<Quiz>, CatalogError> {
        Ok(self.quizzes.get(&id).cloned())
    }

    async fn course(&self, id: CourseId) -> Result<Option<Course>, CatalogError> {
        Ok(self.courses.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_catalog_resolves_all_course_items() {
        let catalog = StaticCatalog::sample();
        let course = catalog
            .course(CourseId::new(1))
            .await
            .unwrap()
            .expect("sample course");

        for item in course.items() {
            match item {
                CourseItem::Lesson(id) => {
                    assert!(catalog.lesson(*id).await.unwrap().is_some());
                }
                CourseItem::Quiz(id) => {
                    assert!(catalog.quiz(*id).await.unwrap().is_some());
                }
            }
        }
    }

    #[tokio::test]
    async fn unknown_ids_resolve_to_none() {
        let catalog = StaticCatalog::sample();
        assert!(catalog.lesson(LessonId::new(999)).await.unwrap().is_none());
        assert!(catalog.quiz(QuizId::new(999)).await.unwrap().is_none());
        assert!(catalog.course(CourseId::new(999)).await.unwrap().is_none());
    }
}
