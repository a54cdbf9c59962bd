mod course;
mod ids;
mod lesson_progress;
mod quiz_progress;

pub use ids::{CourseId, LessonId, ParseIdError, QuizId, UserId};

pub use course::{Course, CourseError, CourseItem, Lesson, Quiz, QuizQuestion};
pub use lesson_progress::{LessonProgress, LessonProgressError};
pub use quiz_progress::{MAX_SCORE, QuizProgress, QuizProgressError};
