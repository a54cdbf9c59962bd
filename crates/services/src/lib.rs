#![forbid(unsafe_code)]

pub mod catalog;
pub mod course_view;
pub mod error;
pub mod progress_service;
pub mod quiz_service;

pub use course_core::Clock;

pub use error::{CatalogError, CourseViewError, ProgressError, QuizError};

pub use catalog::{CourseCatalog, StaticCatalog};
pub use course_view::{CourseItemView, CourseView, CourseViewService};
pub use progress_service::ProgressService;
pub use quiz_service::QuizService;
