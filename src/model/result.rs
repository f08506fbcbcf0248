use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    pub commits: u64,
    pub pull_requests: u64,
    pub loc: u64,
    pub files_touched: u64,
    pub reviews: u64,
    pub score: f64,
}

impl UserRecord {
    pub fn new(name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub commits: u64,
}

/// Finalized metrics of one run, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    #[serde(rename = "_report_info")]
    pub report_info: ReportInfo,
    pub total_commits: u64,
    pub total_pull_requests: u64,
    pub commits_per_pull_request: f64,
    pub predicted_pull_requests: f64,
    pub active_users: u64,
    pub team_score: f64,
    pub users: Vec<UserRecord>,
    pub per_repository: IndexMap<String, RepositoryStats>,
}
