use std::fmt;
use std::path::PathBuf;

use services::{AppServices, Clock, TutorConfig};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingQuizId,
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidAnswers { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingQuizId => write!(f, "take requires a quiz id"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAnswers { raw } => write!(f, "invalid --answers value: {raw}"),
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
    eprintln!("  cargo run -p app -- quizzes  [--db <sqlite_url>] [--catalog <json>]");
    eprintln!("  cargo run -p app -- take <quiz-id> [--answers 2,1,-] [--db ..] [--catalog ..]");
    eprintln!("  cargo run -p app -- profile  [--db ..]");
    eprintln!("  cargo run -p app -- library  [--category <name>] [--search <text>] [--catalog ..]");
    eprintln!("  cargo run -p app -- chat     [<message>...] [--db ..] [--catalog ..]");
    eprintln!();
    eprintln!("Answers are 1-based option numbers; '-' leaves a question unanswered.");
    eprintln!("Without --answers, `take` runs interactively against a live countdown.");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  TUTOR_DB_URL, TUTOR_CATALOG, TUTOR_CHAT_URL, TUTOR_MESSAGE_CAP, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quizzes,
    Take {
        quiz_id: String,
        answers: Option<Vec<Option<usize>>>,
    },
    Profile,
    Library {
        category: Option<String>,
        search: String,
    },
    Chat {
        message: Vec<String>,
    },
}

#[derive(Debug)]
struct Args {
    command: Command,
    db_url: Option<String>,
    catalog: Option<PathBuf>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let Some(first) = args.next() else {
            return Ok(None);
        };

        let mut command = match first.as_str() {
            "quizzes" => Command::Quizzes,
            "take" => Command::Take {
                quiz_id: String::new(),
                answers: None,
            },
            "profile" => Command::Profile,
            "library" => Command::Library {
                category: None,
                search: String::new(),
            },
            "chat" => Command::Chat {
                message: Vec::new(),
            },
            "--help" | "-h" => return Ok(None),
            _ => return Err(ArgsError::UnknownArg(first)),
        };
        let mut db_url = None;
        let mut catalog = None;

        while let Some(arg) = args.next() {
            match (arg.as_str(), &mut command) {
                ("--db", _) => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(value);
                }
                ("--catalog", _) => {
                    catalog = Some(PathBuf::from(require_value(&mut args, "--catalog")?));
                }
                ("--answers", Command::Take { answers, .. }) => {
                    let value = require_value(&mut args, "--answers")?;
                    *answers = Some(parse_answers(&value)?);
                }
                ("--category", Command::Library { category, .. }) => {
                    *category = Some(require_value(&mut args, "--category")?);
                }
                ("--search", Command::Library { search, .. }) => {
                    *search = require_value(&mut args, "--search")?;
                }
                ("--help" | "-h", _) => return Ok(None),
                (other, Command::Take { quiz_id, .. })
                    if quiz_id.is_empty() && !other.starts_with("--") =>
                {
                    *quiz_id = other.to_string();
                }
                (other, Command::Chat { message }) if !other.starts_with("--") => {
                    message.push(other.to_string());
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if matches!(&command, Command::Take { quiz_id, .. } if quiz_id.is_empty()) {
            return Err(ArgsError::MissingQuizId);
        }

        Ok(Some(Self {
            command,
            db_url,
            catalog,
        }))
    }
}

fn parse_answers(raw: &str) -> Result<Vec<Option<usize>>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .map(|part| match part {
            "-" | "" => Ok(None),
            n => n
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .map(Some)
                .ok_or_else(|| ArgsError::InvalidAnswers {
                    raw: raw.to_string(),
                }),
        })
        .collect()
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let Some(parsed) = parsed else {
        print_usage();
        return Ok(());
    };

    let mut config = TutorConfig::from_env()?;
    if let Some(db_url) = parsed.db_url {
        config.db_url = db_url;
    }
    if let Some(catalog) = parsed.catalog {
        config.catalog_path = Some(catalog);
    }
    config.db_url = normalize_sqlite_url(config.db_url);
    debug!(?config, "configuration resolved");

    // Keep file creation in the binary glue so the library crates stay free of it.
    prepare_sqlite_file(&config.db_url)?;
    let app = AppServices::from_config(&config, Clock::system()).await?;

    match parsed.command {
        Command::Quizzes => commands::list_quizzes(&app).await,
        Command::Take { quiz_id, answers } => commands::take_quiz(&app, &quiz_id, answers).await,
        Command::Profile => commands::show_profile(&app).await,
        Command::Library { category, search } => {
            commands::show_library(&app, category.as_deref(), &search).await
        }
        Command::Chat { message } => commands::chat(&app, &message.join(" ")).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
