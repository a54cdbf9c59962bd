//! Binary crate wiring: HTTP API server plus the study-mode client loop.
//!
//! Exposed as a library so integration tests can drive the router without
//! binding a socket.

#![forbid(unsafe_code)]

pub mod api;
pub mod content;

pub use api::{AppContext, build_router, serve};
pub use content::{ContentError, load_catalog};
