//! Domain model and pure progression rules for the course platform.
//!
//! Everything here is free of I/O: progress records, course reference data,
//! the completion ceiling, quiz grading and course rollup math. Persistence
//! and transport live in the sibling crates.

pub mod api;
pub mod completion;
pub mod model;
pub mod rollup;
pub mod time;

pub use completion::{IncrementOutcome, SubmitPolicy};
pub use model::{
    Course, CourseId, CourseItem, Lesson, LessonId, LessonProgress, Quiz, QuizId, QuizProgress,
    UserId,
};
pub use time::Clock;
