use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use tracing::info;

use course_core::api::{
    CourseItemBody, CourseViewBody, HealthBody, LessonBody, LessonProgressBody, ProgressResponse,
    ProgressSnapshot, ProgressSubmission, QuizProgressBody, QuizResponse, QuizSubmission,
    ResetBody, SetDurationBody, SetScoreBody, SubmitIntent,
};
use course_core::model::{CourseId, CourseItem, LessonId, QuizId, UserId};
use course_services::course_view::CourseView;

use crate::api::error::{ApiError, ApiResult};
use crate::api::identity;
use crate::api::server::AppContext;

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".to_string(),
        module: "course-app".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ─── LEARNER ENDPOINTS ─────────────────────────────────────────────────────────

/// GET /api/progress
pub async fn get_progress(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> ApiResult<Json<ProgressSnapshot>> {
    let user = identity::current_user(&headers)?;
    Ok(Json(load_snapshot(&ctx, user.user_id).await?))
}

/// POST /api/progress
///
/// The one write path learners have for lessons. The body names the lesson
/// and an intent; an increment credits one server-configured interval, so
/// the request deliberately carries no client-measured time.
pub async fn submit_progress(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Json(body): Json<ProgressSubmission>,
) -> ApiResult<Json<ProgressResponse>> {
    let user = identity::current_user(&headers)?;
    let lesson_id = LessonId::new(body.lesson_id);

    let progress = match body.intent {
        SubmitIntent::MarkComplete => ctx.progress.mark_complete(user.user_id, lesson_id).await?,
        SubmitIntent::IncrementDuration => {
            let credit = ctx.progress.policy().submit_interval_secs;
            ctx.progress
                .increment_progress(user.user_id, lesson_id, credit)
                .await?
        }
    };

    if progress.is_completed() {
        info!("user {} completed lesson {}", user.user_id, lesson_id);
    }
    Ok(Json(ProgressResponse {
        progress: LessonProgressBody::from(&progress),
    }))
}

/// GET /api/lessons/{id}
pub async fn get_lesson(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(lesson_id): Path<u64>,
) -> ApiResult<Json<LessonBody>> {
    identity::current_user(&headers)?;
    let lesson = ctx
        .catalog
        .lesson(LessonId::new(lesson_id))
        .await
        .map_err(|err| {
            tracing::error!("catalog lookup failed: {err}");
            ApiError::Internal("catalog unavailable".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound(format!("lesson {lesson_id} does not exist")))?;
    Ok(Json(LessonBody::from(&lesson)))
}

/// POST /api/quizzes/{id}/submit
pub async fn submit_quiz(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(quiz_id): Path<u64>,
    Json(body): Json<QuizSubmission>,
) -> ApiResult<Json<QuizResponse>> {
    let user = identity::current_user(&headers)?;
    let progress = ctx
        .quizzes
        .submit(user.user_id, QuizId::new(quiz_id), &body.answers)
        .await?;

    info!(
        "user {} scored {} on quiz {quiz_id} (passed: {})",
        user.user_id,
        progress.score(),
        progress.is_completed()
    );
    Ok(Json(QuizResponse {
        progress: QuizProgressBody::from(&progress),
    }))
}

/// GET /api/courses/{id}/view
pub async fn course_view(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(course_id): Path<u64>,
) -> ApiResult<Json<CourseViewBody>> {
    let user = identity::current_user(&headers)?;
    let view = ctx
        .views
        .course_view(user.user_id, CourseId::new(course_id))
        .await?;
    Ok(Json(render_course_view(&view)))
}

// ─── ADMIN ENDPOINTS ───────────────────────────────────────────────────────────

/// GET /api/admin/users/{user}/progress
pub async fn admin_snapshot(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ProgressSnapshot>> {
    identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    Ok(Json(load_snapshot(&ctx, target).await?))
}

/// DELETE /api/admin/users/{user}/progress
pub async fn admin_reset_all(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ResetBody>> {
    let admin = identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;

    let lessons_removed = ctx.progress.reset_all(target).await?;
    let quizzes_removed = ctx.quizzes.reset_all(target).await?;
    info!(
        "admin {} reset all progress for user {target} ({} records)",
        admin.user_id,
        lessons_removed + quizzes_removed
    );
    Ok(Json(ResetBody {
        removed: lessons_removed + quizzes_removed,
    }))
}

/// POST /api/admin/users/{user}/courses/{id}/complete
///
/// Marks every item in the course complete for the user: lessons directly,
/// quizzes by granting the passing score. Already-completed items are left
/// untouched, so repairing a half-finished course is safe.
pub async fn admin_complete_course(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((user_id, course_id)): Path<(String, u64)>,
) -> ApiResult<Json<CourseViewBody>> {
    let admin = identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    let course_id = CourseId::new(course_id);

    let course = ctx
        .catalog
        .course(course_id)
        .await
        .map_err(|err| {
            tracing::error!("catalog lookup failed: {err}");
            ApiError::Internal("catalog unavailable".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound(format!("course {course_id} does not exist")))?;

    for item in course.items() {
        match item {
            CourseItem::Lesson(lesson_id) => {
                ctx.progress.mark_complete(target, *lesson_id).await?;
            }
            CourseItem::Quiz(quiz_id) => {
                ctx.quizzes.complete_quiz(target, *quiz_id).await?;
            }
        }
    }
    info!(
        "admin {} completed course {course_id} for user {target}",
        admin.user_id
    );

    let view = ctx.views.course_view(target, course_id).await?;
    Ok(Json(render_course_view(&view)))
}

/// PUT /api/admin/users/{user}/lessons/{id}/duration
pub async fn admin_set_duration(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((user_id, lesson_id)): Path<(String, u64)>,
    Json(body): Json<SetDurationBody>,
) -> ApiResult<Json<ProgressResponse>> {
    identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    let progress = ctx
        .progress
        .set_duration(target, LessonId::new(lesson_id), body.duration_in_seconds)
        .await?;
    Ok(Json(ProgressResponse {
        progress: LessonProgressBody::from(&progress),
    }))
}

/// POST /api/admin/users/{user}/lessons/{id}/complete
pub async fn admin_complete_lesson(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((user_id, lesson_id)): Path<(String, u64)>,
) -> ApiResult<Json<ProgressResponse>> {
    identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    let progress = ctx
        .progress
        .mark_complete(target, LessonId::new(lesson_id))
        .await?;
    Ok(Json(ProgressResponse {
        progress: LessonProgressBody::from(&progress),
    }))
}

/// DELETE /api/admin/users/{user}/lessons/{id}
pub async fn admin_reset_lesson(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((user_id, lesson_id)): Path<(String, u64)>,
) -> ApiResult<StatusCode> {
    identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    ctx.progress
        .reset_lesson(target, LessonId::new(lesson_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/users/{user}/quizzes/{id}/score
pub async fn admin_set_score(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((user_id, quiz_id)): Path<(String, u64)>,
    Json(body): Json<SetScoreBody>,
) -> ApiResult<Json<QuizResponse>> {
    identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    let progress = ctx
        .quizzes
        .set_score(target, QuizId::new(quiz_id), body.score)
        .await?;
    Ok(Json(QuizResponse {
        progress: QuizProgressBody::from(&progress),
    }))
}

/// POST /api/admin/users/{user}/quizzes/{id}/complete
pub async fn admin_complete_quiz(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((user_id, quiz_id)): Path<(String, u64)>,
) -> ApiResult<Json<QuizResponse>> {
    identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    let progress = ctx
        .quizzes
        .complete_quiz(target, QuizId::new(quiz_id))
        .await?;
    Ok(Json(QuizResponse {
        progress: QuizProgressBody::from(&progress),
    }))
}

/// DELETE /api/admin/users/{user}/quizzes/{id}
pub async fn admin_reset_quiz(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    Path((user_id, quiz_id)): Path<(String, u64)>,
) -> ApiResult<StatusCode> {
    identity::require_admin(&headers)?;
    let target = parse_user_id(&user_id)?;
    ctx.quizzes
        .reset_quiz(target, QuizId::new(quiz_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── HELPERS ───────────────────────────────────────────────────────────────────

async fn load_snapshot(ctx: &AppContext, user_id: UserId) -> ApiResult<ProgressSnapshot> {
    let lessons = ctx.progress.list_progress(user_id).await?;
    let quizzes = ctx.quizzes.list_progress(user_id).await?;
    Ok(ProgressSnapshot {
        lesson_progress: lessons.iter().map(LessonProgressBody::from).collect(),
        quiz_progress: quizzes.iter().map(QuizProgressBody::from).collect(),
    })
}

fn render_course_view(view: &CourseView) -> CourseViewBody {
    CourseViewBody {
        course_id: view.course_id.value(),
        slug: view.slug.clone(),
        percent_complete: view.percent_complete,
        items: view
            .items
            .iter()
            .map(|entry| {
                let (kind, id) = match entry.item {
                    CourseItem::Lesson(id) => ("lesson", id.value()),
                    CourseItem::Quiz(id) => ("quiz", id.value()),
                };
                CourseItemBody {
                    kind: kind.to_string(),
                    id,
                    slug: entry.slug.clone(),
                    status: entry.status.as_str().to_string(),
                }
            })
            .collect(),
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation("user id must be a UUID".to_string()))
}
