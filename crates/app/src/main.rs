use std::fmt;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use course_app::api::{AppContext, serve};
use course_app::content::load_catalog;
use course_client::{HttpProgressClient, LessonTimer, ProgressSync, track_lesson};
use course_core::Clock;
use course_core::completion::SubmitPolicy;
use course_core::model::{LessonId, UserId};
use course_core::time::format_secs;
use course_services::catalog::{CourseCatalog, StaticCatalog};
use course_storage::repository::Storage;
use tracing::info;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidPort { raw: String },
    InvalidLessonId { raw: String },
    InvalidUserId { raw: String },
    MissingLesson,
    MissingUser,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidPort { raw } => write!(f, "invalid --port value: {raw}"),
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid --lesson value: {raw}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::MissingLesson => write!(f, "study requires --lesson <id>"),
            ArgsError::MissingUser => {
                write!(f, "study requires --user <uuid> (or COURSE_USER_ID)")
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p course-app -- serve [--db <sqlite_url>] [--port <port>] [--content <file>]");
    eprintln!("  cargo run -p course-app -- study --lesson <id> --user <uuid> [--server <url>]");
    eprintln!();
    eprintln!("Defaults for serve:");
    eprintln!("  --db sqlite://course.sqlite3");
    eprintln!("  --port 4000");
    eprintln!();
    eprintln!("Defaults for study:");
    eprintln!("  --server http://localhost:4000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_DB_URL, COURSE_PORT, COURSE_CONTENT, COURSE_SERVER_URL, COURSE_USER_ID");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Study,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "study" => Some(Self::Study),
            _ => None,
        }
    }
}

struct ServeArgs {
    db_url: String,
    port: u16,
    content: Option<PathBuf>,
}

impl ServeArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("COURSE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://course.sqlite3".into(), normalize_sqlite_url);
        let mut port = std::env::var("COURSE_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(4000);
        let mut content = std::env::var("COURSE_CONTENT").ok().map(PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--port" => {
                    let value = require_value(args, "--port")?;
                    port = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPort { raw: value.clone() })?;
                }
                "--content" => {
                    let value = require_value(args, "--content")?;
                    content = Some(PathBuf::from(value));
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
            port,
            content,
        })
    }
}

struct StudyArgs {
    server_url: String,
    user_id: UserId,
    lesson_id: LessonId,
}

impl StudyArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut server_url = std::env::var("COURSE_SERVER_URL")
            .unwrap_or_else(|_| "http://localhost:4000".into());
        let mut user_id = std::env::var("COURSE_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok());
        let mut lesson_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--server" => {
                    server_url = require_value(args, "--server")?;
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let parsed = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    user_id = Some(parsed);
                }
                "--lesson" => {
                    let value = require_value(args, "--lesson")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLessonId { raw: value.clone() })?;
                    lesson_id = Some(LessonId::new(parsed));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            server_url,
            user_id: user_id.ok_or(ArgsError::MissingUser)?,
            lesson_id: lesson_id.ok_or(ArgsError::MissingLesson)?,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: serving the API when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Serve,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Serve,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    match cmd {
        Command::Serve => {
            let args = ServeArgs::parse(&mut iter).map_err(|e| {
                eprintln!("{e}");
                print_usage();
                e
            })?;
            run_server(args).await
        }
        Command::Study => {
            let args = StudyArgs::parse(&mut iter).map_err(|e| {
                eprintln!("{e}");
                print_usage();
                e
            })?;
            run_study(args).await
        }
    }
}

async fn run_server(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;

    let catalog: Arc<dyn CourseCatalog> = match &args.content {
        Some(path) => {
            let catalog = load_catalog(path)?;
            info!("loaded content catalog from {}", path.display());
            Arc::new(catalog)
        }
        None => {
            info!("no content file given; serving the built-in sample catalog");
            Arc::new(StaticCatalog::sample())
        }
    };

    let ctx = AppContext::new(
        Clock::default_clock(),
        &storage,
        catalog,
        SubmitPolicy::default(),
    );
    serve(ctx, args.port).await?;
    Ok(())
}

async fn run_study(args: StudyArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = HttpProgressClient::new(args.server_url, args.user_id);

    let Some(lesson) = client.lesson(args.lesson_id).await? else {
        return Err(format!("lesson {} does not exist on the server", args.lesson_id).into());
    };

    let Some(required) = lesson.required_duration_in_seconds else {
        // Untimed lessons complete on an explicit mark; there is nothing to time.
        client.mark_complete(args.lesson_id).await?;
        println!("{}: untimed lesson marked complete", lesson.slug);
        return Ok(());
    };

    let snapshot = client.lesson_snapshot(args.lesson_id).await?;
    if snapshot.completed {
        println!("{}: already completed", lesson.slug);
        return Ok(());
    }

    let timer = LessonTimer::resuming(
        required,
        snapshot.saved_secs.unwrap_or(0),
        SubmitPolicy::default(),
    );
    println!("{}: watching, {} required", lesson.slug, format_secs(required));

    let handle = track_lesson(args.lesson_id, timer, Arc::new(client));
    let mut view = handle.view();

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = view.borrow().clone();
                print!("\r  {} ({:>3}%)", current.display(), current.percent);
                let _ = std::io::stdout().flush();
                if current.completed {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("stopping; flushing unsynced progress");
                handle.stop().await;
            }
        }
    }
    handle.join().await;

    println!();
    let last = view.borrow().clone();
    if last.completed {
        println!("{}: completed", lesson.slug);
    } else {
        println!("{}: progress saved at {}", lesson.slug, last.display());
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
