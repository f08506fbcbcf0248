use crate::git::CommitStats;
use crate::github::PullRequestDiff;
use crate::model::{Config, Project, ReportInfo, RepositoryStats, UserRecord};
use indexmap::IndexMap;

/// Partial facts gathered during a run, keyed by canonical user.
#[derive(Debug, Clone)]
pub struct DataAnalysis {
    pub report_info: ReportInfo,
    pub total_commits: u64,
    pub total_pull_requests: u64,
    pub per_repository: IndexMap<String, RepositoryStats>,
    pub users: IndexMap<String, UserRecord>,
}

impl DataAnalysis {
    pub fn new(config: &Config) -> Self {
        Self {
            report_info: ReportInfo {
                start_date: config.start_date,
                end_date: config.end_date,
            },
            total_commits: 0,
            total_pull_requests: 0,
            per_repository: config
                .projects
                .iter()
                .map(|project| (project.slug.clone(), RepositoryStats::default()))
                .collect(),
            users: IndexMap::new(),
        }
    }

    pub fn user_mut(&mut self, alias: &str) -> &mut UserRecord {
        self.users
            .entry(alias.to_string())
            .or_insert_with(|| UserRecord::new(alias))
    }

    pub fn insert_commits(&mut self, project: &Project, stats: &CommitStats) {
        self.total_commits += stats.total;
        self.per_repository
            .entry(project.slug.clone())
            .or_default()
            .commits += stats.total;
        for (author, commits) in &stats.by_author {
            self.user_mut(author).commits += commits;
        }
    }

    pub fn insert_pull_requests(&mut self, alias: &str, count: u64) {
        self.user_mut(alias).pull_requests += count;
    }

    pub fn insert_pull_request_diff(&mut self, alias: &str, diff: &PullRequestDiff) {
        let user = self.user_mut(alias);
        user.loc += diff.loc();
        user.files_touched += diff.changed_files;
    }

    pub fn insert_review(&mut self, reviewer: &str) {
        self.user_mut(reviewer).reviews += 1;
    }
}
