use std::fmt;

use chrono::{DateTime, Utc};
use course_core::model::{LessonId, LessonProgress, QuizId, QuizProgress, UserId};
use course_storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    in_progress: u32,
    completed: u32,
    quizzes: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidCount { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => {
                write!(f, "invalid --user value (expected UUID): {raw}")
            }
            ArgsError::InvalidCount { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_count(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.parse::<u32>()
        .map_err(|_| ArgsError::InvalidCount { flag, raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("COURSE_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = std::env::var("COURSE_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(UserId::random);
        let mut in_progress = 2;
        let mut completed = 1;
        let mut quizzes = 1;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--in-progress" => {
                    let value = require_value(&mut args, "--in-progress")?;
                    in_progress = parse_count("--in-progress", value)?;
                }
                "--completed" => {
                    let value = require_value(&mut args, "--completed")?;
                    completed = parse_count("--completed", value)?;
                }
                "--quizzes" => {
                    let value = require_value(&mut args, "--quizzes")?;
                    quizzes = parse_count("--quizzes", value)?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            in_progress,
            completed,
            quizzes,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p course-storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --user <uuid>             Learner to seed (default: random)");
    eprintln!("  --in-progress <n>         Partially watched lessons to insert (default: 2)");
    eprintln!("  --completed <n>           Completed lessons to insert (default: 1)");
    eprintln!("  --quizzes <n>             Quiz attempts to insert (default: 1)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  COURSE_DB_URL, COURSE_USER_ID");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut lesson_id = 0_u64;

    for i in 0..args.in_progress {
        lesson_id += 1;
        let record = LessonProgress::started(
            args.user_id,
            LessonId::new(lesson_id),
            15 * (i + 1),
            now,
        );
        storage.lessons.upsert_lesson_progress(&record).await?;
    }

    for _ in 0..args.completed {
        lesson_id += 1;
        let record =
            LessonProgress::completed(args.user_id, LessonId::new(lesson_id), Some(120), now);
        storage.lessons.upsert_lesson_progress(&record).await?;
    }

    for i in 0..args.quizzes {
        // alternate passing and failing attempts against a 70 threshold
        let score = if i % 2 == 0 { 85 } else { 55 };
        let record =
            QuizProgress::record(args.user_id, QuizId::new(u64::from(i + 1)), score, 70, now);
        storage.quizzes.upsert_quiz_progress(&record).await?;
    }

    println!(
        "Seeded user {} with {} in-progress lessons, {} completed lessons and {} quiz attempts into {}",
        args.user_id,
        args.in_progress,
        args.completed,
        args.quizzes,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
