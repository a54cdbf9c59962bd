//! REST API for course progress tracking.
//!
//! Routes split into a learner surface under `/api` and an admin surface
//! under `/api/admin`; identity comes from trusted proxy headers.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use identity::{CurrentUser, Role};
pub use server::{AppContext, build_router, serve};
