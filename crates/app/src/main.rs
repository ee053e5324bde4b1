use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::SessionConfig;
use quiz_core::time::format_countdown;
use services::{QuizEngine, QuizHistoryService, QuizStatus};
use storage::bank::{load_bank, sample_bank};
use storage::json_file::JsonFileSolvedSetStore;
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidSize { raw: String },
    InvalidSeconds { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSize { raw } => write!(f, "invalid --size value: {raw}"),
            ArgsError::InvalidSeconds { raw } => write!(f, "invalid --seconds value: {raw}"),
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
    eprintln!("  cargo run -p app -- play    [--db <sqlite_url>] [--solved-json <file.json>] [--bank <file.json>] [--size <n>] [--seconds <n>]");
    eprintln!("  cargo run -p app -- reset   [--db <sqlite_url>] [--solved-json <file.json>] [--bank <file.json>]");
    eprintln!("  cargo run -p app -- history [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --solved-json <unset: solved questions live in the sqlite db>");
    eprintln!("  --bank <bundled biology questions>");
    eprintln!("  --size 3 --seconds 60");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_SOLVED_JSON, QUIZ_BANK, QUIZ_SESSION_SIZE,");
    eprintln!("  QUIZ_SECONDS_PER_QUESTION, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Reset,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "reset" => Some(Self::Reset),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    solved_json: Option<PathBuf>,
    bank: Option<PathBuf>,
    session_size: u32,
    seconds_per_question: u32,
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

impl Args {
    fn from_env() -> Self {
        Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url),
            solved_json: std::env::var_os("QUIZ_SOLVED_JSON").map(PathBuf::from),
            bank: std::env::var_os("QUIZ_BANK").map(PathBuf::from),
            session_size: std::env::var("QUIZ_SESSION_SIZE")
                .ok()
                .and_then(|v| parse_positive(&v))
                .unwrap_or(SessionConfig::DEFAULT_SESSION_SIZE),
            seconds_per_question: std::env::var("QUIZ_SECONDS_PER_QUESTION")
                .ok()
                .and_then(|v| parse_positive(&v))
                .unwrap_or(SessionConfig::DEFAULT_SECONDS_PER_QUESTION),
        }
    }

    fn parse(mut self, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    self.db_url = normalize_sqlite_url(value);
                }
                "--solved-json" => {
                    self.solved_json = Some(PathBuf::from(require_value(args, "--solved-json")?));
                }
                "--bank" => {
                    self.bank = Some(PathBuf::from(require_value(args, "--bank")?));
                }
                "--size" => {
                    let value = require_value(args, "--size")?;
                    self.session_size =
                        parse_positive(&value).ok_or(ArgsError::InvalidSize { raw: value })?;
                }
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    self.seconds_per_question =
                        parse_positive(&value).ok_or(ArgsError::InvalidSeconds { raw: value })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(self)
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

async fn build_engine(
    parsed: &Args,
    storage: &Storage,
) -> Result<QuizEngine, Box<dyn std::error::Error>> {
    let bank = match &parsed.bank {
        Some(path) => load_bank(path).await?,
        None => sample_bank()?,
    };
    Ok(QuizEngine::new(bank, storage.solved.clone()).with_results(storage.results.clone()))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::from_env()
        .parse(&mut argv.into_iter())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let mut storage = Storage::sqlite(&parsed.db_url).await?;
    if let Some(path) = &parsed.solved_json {
        tracing::debug!(path = %path.display(), "solved questions kept in json file");
        storage.solved = Arc::new(JsonFileSolvedSetStore::new(path.clone()));
    }

    match cmd {
        Command::Play => {
            let config = SessionConfig::new(parsed.session_size, parsed.seconds_per_question)?;
            let mut engine = build_engine(&parsed, &storage).await?;
            play::run(&mut engine, config).await
        }
        Command::Reset => {
            let mut engine = build_engine(&parsed, &storage).await?;
            if engine.check_progress().await == QuizStatus::AllSolved {
                engine.reset().await?;
                println!("Progress reset. Every question is available again.");
            } else {
                println!("There are still unsolved questions; nothing to reset.");
            }
            Ok(())
        }
        Command::History => {
            let history = QuizHistoryService::new(storage.results.clone());
            let items = history.list_recent(20).await?;
            if items.is_empty() {
                println!("No quizzes yet.");
                return Ok(());
            }
            for item in &items {
                println!(
                    "#{:<4} {}  {}/{} marks  {} questions  ({}, {} left)",
                    item.id,
                    item.submitted_at.format("%Y-%m-%d %H:%M"),
                    item.score,
                    item.max_score,
                    item.questions,
                    item.trigger,
                    format_countdown(item.remaining_seconds),
                );
            }
            let totals = history.totals(20).await?;
            println!(
                "Last {} quizzes: {}/{} marks, {} ran out of time.",
                totals.sessions, totals.score, totals.max_score, totals.expired,
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Args {
        Args {
            db_url: "sqlite://quiz.sqlite3".into(),
            solved_json: None,
            bank: None,
            session_size: 3,
            seconds_per_question: 60,
        }
    }

    fn parse(raw: &[&str]) -> Result<Args, ArgsError> {
        defaults().parse(&mut raw.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_session_flags() {
        let args = parse(&["--size", "5", "--seconds", "30", "--bank", "bank.json"]).unwrap();
        assert_eq!(args.session_size, 5);
        assert_eq!(args.seconds_per_question, 30);
        assert_eq!(args.bank, Some(PathBuf::from("bank.json")));
        assert_eq!(args.solved_json, None);
    }

    #[test]
    fn solved_json_selects_the_file_store() {
        let args = parse(&["--solved-json", "solved.json"]).unwrap();
        assert_eq!(args.solved_json, Some(PathBuf::from("solved.json")));
        assert!(matches!(
            parse(&["--solved-json"]),
            Err(ArgsError::MissingValue { flag: "--solved-json" })
        ));
    }

    #[test]
    fn rejects_zero_and_missing_values() {
        assert!(matches!(
            parse(&["--size", "0"]),
            Err(ArgsError::InvalidSize { .. })
        ));
        assert!(matches!(
            parse(&["--seconds"]),
            Err(ArgsError::MissingValue { flag: "--seconds" })
        ));
        assert!(matches!(
            parse(&["--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn keeps_memory_and_absolute_urls() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db"
        );
        assert!(normalize_sqlite_url("quiz.db".into()).starts_with("sqlite://"));
    }
}
