use crate::github::client::GithubClient;
use crate::github::paginator::{fetch_all, PageItems};
use crate::model::Project;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Contributor {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PullRequestLinks {
    pub url: String,
}

/// A pull request as returned by the issue search.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PullRequest {
    pub user: Option<Account>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub draft: bool,
    pub pull_request: Option<PullRequestLinks>,
}

impl PullRequest {
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().map(|user| user.login.as_str())
    }

    /// Non-draft and created on a day within `since..=until`.
    pub fn counts_in(&self, since: NaiveDate, until: NaiveDate) -> bool {
        let created = self.created_at.date_naive();
        !self.draft && created >= since && created <= until
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PullRequestDiff {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changed_files: u64,
}

impl PullRequestDiff {
    pub fn loc(&self) -> u64 {
        self.additions + self.deletions
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Review {
    pub user: Option<Account>,
}

pub trait GithubPullRequester {
    async fn fetch_contributors(&self, client: &GithubClient) -> Vec<Contributor>;

    async fn fetch_pull_requests(
        &self,
        client: &GithubClient,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Vec<PullRequest>;
}

impl GithubPullRequester for Project {
    async fn fetch_contributors(&self, client: &GithubClient) -> Vec<Contributor> {
        let endpoint = format!("/repos/{}/contributors", self.api_path());
        fetch_all(client, &endpoint, PageItems::Root).await
    }

    async fn fetch_pull_requests(
        &self,
        client: &GithubClient,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Vec<PullRequest> {
        let endpoint = format!(
            "/search/issues?q=repo:{}+draft:false+is:pr+created:{since}..{until}",
            self.api_path()
        );
        fetch_all(client, &endpoint, PageItems::Field("items")).await
    }
}

/// Diff stats of a pull request, `None` when they could not be fetched.
pub async fn fetch_diff(client: &GithubClient, pull_request: &PullRequest) -> Option<PullRequestDiff> {
    let links = pull_request.pull_request.as_ref()?;
    let endpoint = client.endpoint(&links.url);
    match client.get(&endpoint, None).await {
        Ok(response) if response.is_ok() => match serde_json::from_value(response.data) {
            Ok(diff) => Some(diff),
            Err(e) => {
                warn!(%endpoint, error = %e, "Pull request has no readable diff stats");
                Some(PullRequestDiff::default())
            }
        },
        Ok(response) => {
            warn!(%endpoint, status = response.status, "Pull request diff stats unavailable");
            Some(PullRequestDiff::default())
        }
        Err(e) => {
            warn!(%endpoint, error = %e, "Failed to fetch pull request");
            None
        }
    }
}

pub async fn fetch_reviews(client: &GithubClient, pull_request: &PullRequest) -> Vec<Review> {
    let Some(links) = pull_request.pull_request.as_ref() else {
        return vec![];
    };
    let endpoint = format!("{}/reviews", client.endpoint(&links.url));
    match client.get(&endpoint, None).await {
        Ok(response) if response.is_ok() => match serde_json::from_value(response.data) {
            Ok(reviews) => reviews,
            Err(e) => {
                warn!(%endpoint, error = %e, "Pull request reviews are not a list");
                vec![]
            }
        },
        Ok(response) => {
            warn!(%endpoint, status = response.status, "Pull request reviews unavailable");
            vec![]
        }
        Err(e) => {
            warn!(%endpoint, error = %e, "Failed to fetch pull request reviews");
            vec![]
        }
    }
}
