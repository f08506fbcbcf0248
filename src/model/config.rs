use crate::error::ConfigError;
use crate::model::{Period, Project};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub directory: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub projects: Vec<Project>,
    pub aliases: IndexMap<String, Vec<String>>,
    pub ignore_users: Vec<String>,
    pub github_token: Option<String>,
    /// Serve cached API responses instead of calling the API again.
    pub skip_cache: bool,
    pub commits_per_pull_request: Option<f64>,
    pub results_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    directory: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    #[serde(default)]
    projects: Vec<String>,
    #[serde(default)]
    aliases: IndexMap<String, Vec<String>>,
    #[serde(default)]
    ignore_users: Vec<String>,
    #[serde(default)]
    tokens: Tokens,
    #[serde(default)]
    skip_cache: bool,
    commits_per_pull_request: Option<Value>,
    results_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Tokens {
    github: Option<String>,
}

// Create
impl Config {
    pub fn from_config(path: &Path) -> Result<Self, ConfigError> {
        let json_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&json_str)
    }

    /// Narrows the date range to `period` and names the results after it.
    pub fn with_period(mut self, period: &Period) -> Self {
        self.start_date = period.start_date;
        self.end_date = period.end_date;
        self.results_name = Some(period.name.clone());
        self
    }
}

// Parser
impl Config {
    pub fn parse(json_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json_str)?;

        let directory = match raw.directory {
            Some(directory) if Path::new(&directory).is_dir() => PathBuf::from(directory),
            Some(directory) => return Err(ConfigError::InvalidDirectory(directory)),
            None => return Err(ConfigError::InvalidDirectory(String::new())),
        };
        let start_date = parse_date("startDate", raw.start_date)?;
        let end_date = parse_date("endDate", raw.end_date)?;
        if start_date > end_date {
            return Err(ConfigError::DateOrder {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        let github_token = raw.tokens.github.filter(|token| !token.trim().is_empty());
        if github_token.is_none() {
            warn!("GitHub API token not configured, add tokens.github for pull request and review stats");
        }

        Ok(Self {
            directory,
            start_date,
            end_date,
            projects: raw.projects.iter().map(|p| Project::parse(p)).collect(),
            aliases: raw.aliases,
            ignore_users: raw.ignore_users,
            github_token,
            skip_cache: raw.skip_cache,
            commits_per_pull_request: raw
                .commits_per_pull_request
                .as_ref()
                .and_then(numeric_override),
            results_name: raw.results_name.filter(|name| !name.is_empty()),
        })
    }
}

fn parse_date(field: &'static str, value: Option<String>) -> Result<NaiveDate, ConfigError> {
    let Some(value) = value else {
        return Err(ConfigError::InvalidDate {
            field,
            value: String::new(),
        });
    };
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ConfigError::InvalidDate { field, value })
}

// Zero and non-numeric values fall back to the measured ratio.
fn numeric_override(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (number.is_finite() && number != 0.0).then_some(number)
}
