//! HTTP server setup and routing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use course_core::Clock;
use course_core::completion::SubmitPolicy;
use course_services::catalog::CourseCatalog;
use course_services::{CourseViewService, ProgressService, QuizService};
use course_storage::repository::Storage;

use crate::api::handlers;

/// Shared application context passed to all handlers.
///
/// `Clone` is cheap: the services hold `Arc`s internally.
#[derive(Clone)]
pub struct AppContext {
    pub progress: ProgressService,
    pub quizzes: QuizService,
    pub views: CourseViewService,
    pub catalog: Arc<dyn CourseCatalog>,
}

impl AppContext {
    #[must_use]
    pub fn new(
        clock: Clock,
        storage: &Storage,
        catalog: Arc<dyn CourseCatalog>,
        policy: SubmitPolicy,
    ) -> Self {
        let progress = ProgressService::new(
            clock,
            Arc::clone(&storage.lessons),
            Arc::clone(&catalog),
        )
        .with_policy(policy);
        let quizzes = QuizService::new(
            clock,
            Arc::clone(&storage.quizzes),
            Arc::clone(&catalog),
        );
        let views = CourseViewService::new(
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.quizzes),
            Arc::clone(&catalog),
        );
        Self {
            progress,
            quizzes,
            views,
            catalog,
        }
    }
}

/// Build the full route table over the given context.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(handlers::health))
        // Learner progress
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/progress", post(handlers::submit_progress))
        .route("/api/lessons/:lesson_id", get(handlers::get_lesson))
        .route("/api/quizzes/:quiz_id/submit", post(handlers::submit_quiz))
        .route("/api/courses/:course_id/view", get(handlers::course_view))
        // Admin overrides
        .route(
            "/api/admin/users/:user_id/progress",
            get(handlers::admin_snapshot),
        )
        .route(
            "/api/admin/users/:user_id/progress",
            delete(handlers::admin_reset_all),
        )
        .route(
            "/api/admin/users/:user_id/courses/:course_id/complete",
            post(handlers::admin_complete_course),
        )
        .route(
            "/api/admin/users/:user_id/lessons/:lesson_id/duration",
            put(handlers::admin_set_duration),
        )
        .route(
            "/api/admin/users/:user_id/lessons/:lesson_id/complete",
            post(handlers::admin_complete_lesson),
        )
        .route(
            "/api/admin/users/:user_id/lessons/:lesson_id",
            delete(handlers::admin_reset_lesson),
        )
        .route(
            "/api/admin/users/:user_id/quizzes/:quiz_id/score",
            put(handlers::admin_set_score),
        )
        .route(
            "/api/admin/users/:user_id/quizzes/:quiz_id/complete",
            post(handlers::admin_complete_quiz),
        )
        .route(
            "/api/admin/users/:user_id/quizzes/:quiz_id",
            delete(handlers::admin_reset_quiz),
        )
        // Attach application context
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local front-end development
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an IO error if the port cannot be bound or the server fails.
pub async fn serve(ctx: AppContext, port: u16) -> Result<(), std::io::Error> {
    let app = build_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
