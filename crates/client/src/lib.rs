#![forbid(unsafe_code)]

pub mod http;
pub mod sync;
pub mod timer;
pub mod tracker;

pub use http::HttpProgressClient;
pub use sync::{LessonSnapshot, ProgressSync, SyncError, SyncOutcome};
pub use timer::{LessonTimer, TimerState};
pub use tracker::{TimerView, TrackerCommand, TrackerHandle, track_lesson};
