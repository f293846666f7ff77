//! Command-line and environment configuration for the `quiz` binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },
    #[error("failed to prepare database file {}: {source}", path.display())]
    DbFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "quiz", version, about = "Certification exam quiz server")]
pub struct Cli {
    /// `SQLite` database URL or path.
    #[arg(long, global = true, env = "QUIZ_DB_URL", default_value = "sqlite://quiz.db")]
    pub db: String,

    /// Address the HTTP server listens on.
    #[arg(long, global = true, env = "QUIZ_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Minutes of inactivity before a session's combo is forgotten.
    #[arg(
        long,
        global = true,
        env = "QUIZ_SESSION_TTL_MINS",
        default_value_t = 180,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub session_ttl_mins: u32,

    #[arg(long, global = true, env = "QUIZ_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Replace all questions from CSV files. Clears answer history.
    Import(ImportArgs),
    /// Replace all questions with a small built-in sample set.
    Seed,
}

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// Past exam questions. Must exist.
    #[arg(long, default_value = "questions.csv")]
    pub questions: PathBuf,

    /// AI mock questions. Skipped when the file does not exist.
    #[arg(long, default_value = "ai_questions.csv")]
    pub ai_questions: PathBuf,

    /// Reassign categories of past exam questions by keyword.
    #[arg(long)]
    pub reclassify: bool,
}

/// Resolved settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub bind: SocketAddr,
    pub session_ttl: chrono::Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Build the runtime config from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDbUrl` for a blank database URL.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        if cli.db.trim().is_empty() {
            return Err(ConfigError::InvalidDbUrl {
                raw: cli.db.clone(),
            });
        }
        Ok(Self {
            db_url: normalize_sqlite_url(&cli.db),
            bind: cli.bind,
            session_ttl: chrono::Duration::minutes(i64::from(cli.session_ttl_mins)),
            log_format: cli.log_format,
        })
    }
}

/// Turns a bare path or any `sqlite:` URL with a relative path into an
/// absolute `sqlite://` URL. Query parameters are kept.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == MEMORY_URL {
        return trimmed.to_owned();
    }

    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return trimmed.to_owned();
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    }
}

/// Creates the database file and its parent directory if missing.
///
/// # Errors
///
/// Returns `ConfigError` if the URL has no path or the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), ConfigError> {
    if db_url == MEMORY_URL {
        return Ok(());
    }

    let invalid = || ConfigError::InvalidDbUrl {
        raw: db_url.to_owned(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid());
    }

    let path = Path::new(path);
    let io_err = |source| ConfigError::DbFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;
    }
    Ok(())
}
