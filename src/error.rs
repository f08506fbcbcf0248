use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write config file `{path}`: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Not a valid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid directory path provided in the configuration: `{0}`")]
    InvalidDirectory(String),
    #[error("Invalid {field} provided in the configuration: `{value}`")]
    InvalidDate { field: &'static str, value: String },
    #[error("startDate {start} is after endDate {end}")]
    DateOrder { start: String, end: String },
    #[error("Invalid period `{0}`, use YYYY or YYYY-MM")]
    InvalidPeriod(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not a valid JSON response from `{endpoint}`: {source}")]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
    #[error("Failed to persist cache fragment `{path}`: {source}")]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid API token: {0}")]
    Token(#[from] reqwest::header::InvalidHeaderValue),
}

#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to spawn `git {args}`: {source}")]
    Spawn {
        args: String,
        source: std::io::Error,
    },
    #[error("`git {args}` exited with {status}: {stderr}")]
    Command {
        args: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("Clone failed: {0}")]
    Clone(#[from] git2::Error),
    #[error("Clone task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History I/O failed on `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Not a valid results file `{path}`: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}
