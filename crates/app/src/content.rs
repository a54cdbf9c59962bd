//! JSON content catalog loading.
//!
//! Authored lessons, quizzes and courses ship as a single JSON document.
//! The raw definitions are deserialized first and then run through the
//! domain constructors, so a content file cannot smuggle in entries the
//! model would reject.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use course_core::model::{
    Course, CourseError, CourseId, CourseItem, Lesson, LessonId, Quiz, QuizId, QuizQuestion,
};
use course_services::catalog::StaticCatalog;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("cannot read content file: {0}")]
    Io(#[from] std::io::Error),

    #[error("content file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid content definition: {0}")]
    Invalid(#[from] CourseError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentFile {
    #[serde(default)]
    lessons: Vec<LessonDef>,
    #[serde(default)]
    quizzes: Vec<QuizDef>,
    #[serde(default)]
    courses: Vec<CourseDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LessonDef {
    id: u64,
    slug: String,
    required_duration_in_seconds: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizDef {
    id: u64,
    slug: String,
    passing_score: u8,
    questions: Vec<QuestionDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionDef {
    prompt: String,
    choices: Vec<String>,
    correct_choice: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseDef {
    id: u64,
    slug: String,
    items: Vec<ItemDef>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum ItemDef {
    Lesson { id: u64 },
    Quiz { id: u64 },
}

/// Load a catalog from a JSON content file on disk.
///
/// # Errors
///
/// Returns `ContentError` if the file cannot be read, is not valid JSON,
/// or contains a definition the domain model rejects.
pub fn load_catalog(path: &Path) -> Result<StaticCatalog, ContentError> {
    let text = fs::read_to_string(path)?;
    let file: ContentFile = serde_json::from_str(&text)?;
    build_catalog(file)
}

fn build_catalog(file: ContentFile) -> Result<StaticCatalog, ContentError> {
    let lessons = file
        .lessons
        .into_iter()
        .map(|def| {
            Lesson::new(
                LessonId::new(def.id),
                def.slug,
                def.required_duration_in_seconds,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let quizzes = file
        .quizzes
        .into_iter()
        .map(|def| {
            let questions = def
                .questions
                .into_iter()
                .map(|q| QuizQuestion::new(q.prompt, q.choices, q.correct_choice))
                .collect::<Result<Vec<_>, _>>()?;
            Quiz::new(QuizId::new(def.id), def.slug, def.passing_score, questions)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let courses = file
        .courses
        .into_iter()
        .map(|def| {
            let items = def
                .items
                .into_iter()
                .map(|item| match item {
                    ItemDef::Lesson { id } => CourseItem::Lesson(LessonId::new(id)),
                    ItemDef::Quiz { id } => CourseItem::Quiz(QuizId::new(id)),
                })
                .collect();
            Course::new(CourseId::new(def.id), def.slug, items)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StaticCatalog::new(lessons, quizzes, courses))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
