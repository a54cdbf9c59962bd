pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, LessonProgressRepository, QuizProgressRepository, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
