//! Per-run orchestration: local git history and GitHub data for every
//! configured project, merged into one [`DataAnalysis`] and then scored.

use crate::analyze::{Analyzer, DataAnalysis};
use crate::git::{GitCommitRepository, GitRepository, GitRunner};
use crate::github::pull_request::{fetch_diff, fetch_reviews};
use crate::github::{Contributor, GithubClient, GithubPullRequester, PullRequest};
use crate::model::{AliasResolver, Config, Project, RunResult};
use crate::utils::{MultiProgressNew, ProgressStyleTemplate};
use chrono::NaiveDate;
use futures::future::join_all;
use indicatif::{MultiProgress, ProgressBar};
use itertools::Itertools;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub async fn gather(
    config: &Config,
    git: Arc<dyn GitRunner>,
    client: Option<&GithubClient>,
    progress: &MultiProgress,
) -> RunResult {
    let aliases = Arc::new(AliasResolver::new(&config.aliases));
    let data_analysis = Arc::new(Mutex::new(DataAnalysis::new(config)));
    if config.projects.is_empty() {
        warn!("No projects found in the configuration");
    } else {
        info!(projects = config.projects.len(), "Fetching stats");
    }

    let local = join_all(config.projects.iter().map(|project| {
        let pb = progress.add_spinner(format!("{}: waiting for git", project.slug));
        tokio::spawn(git_fetch(
            project.clone(),
            config.directory.clone(),
            config.start_date,
            config.end_date,
            git.clone(),
            aliases.clone(),
            data_analysis.clone(),
            pb,
        ))
    }));
    let remote = async {
        match client {
            Some(client) => {
                join_all(config.projects.iter().map(|project| {
                    let pb = progress.add_spinner(format!("{}: waiting for GitHub", project.slug));
                    github_fetch(client, project, config.start_date, config.end_date, pb)
                }))
                .await
            }
            None => vec![],
        }
    };
    let (local, remote) = futures::join!(local, remote);
    for result in local {
        if let Err(e) = result {
            error!(error = %e, "Local git analysis task failed");
        }
    }

    if let Some(client) = client {
        let (contributors, pull_requests): (Vec<_>, Vec<_>) = remote.into_iter().unzip();
        let logins = contributors
            .into_iter()
            .flatten()
            .map(|contributor| contributor.login)
            .unique()
            .collect::<Vec<_>>();
        let pull_requests = pull_requests.into_iter().flatten().collect::<Vec<_>>();
        pull_request_fetch(
            client,
            config,
            &aliases,
            &data_analysis,
            &logins,
            &pull_requests,
            progress,
        )
        .await;
    }

    let analysis = data_analysis.lock().await.clone();
    analysis.analyze(config.commits_per_pull_request, &config.ignore_users)
}

#[allow(clippy::too_many_arguments)]
async fn git_fetch(
    project: Project,
    root: PathBuf,
    since: NaiveDate,
    until: NaiveDate,
    git: Arc<dyn GitRunner>,
    aliases: Arc<AliasResolver>,
    data_analysis: Arc<Mutex<DataAnalysis>>,
    pb: ProgressBar,
) {
    pb.set_message(format!("{}: discovering ...", project.slug));
    let repo_dir = match project.discover(&root, git.as_ref()).await {
        Ok(repo_dir) => repo_dir,
        Err(e) => {
            error!(project = %project.slug, error = %e, "Error discovering project");
            pb.abandon_with_message(format!("❌ {}: discovery failed", project.slug));
            return;
        }
    };

    pb.set_message(format!("{}: reading git history ...", project.slug));
    match git
        .as_ref()
        .count_commits(&repo_dir, since, until, &aliases)
        .await
    {
        Ok(stats) => {
            data_analysis.lock().await.insert_commits(&project, &stats);
            info!(project = %project.slug, commits = stats.total, authors = stats.by_author.len(), "Counted commits");
            pb.finish_with_message(format!(
                "✅ {}: read git history (find {} commits)",
                project.slug, stats.total
            ));
        }
        Err(e) => {
            error!(project = %project.slug, error = %e, "Error counting commits");
            pb.abandon_with_message(format!("❌ {}: git history unavailable", project.slug));
        }
    }
}

async fn github_fetch(
    client: &GithubClient,
    project: &Project,
    since: NaiveDate,
    until: NaiveDate,
    pb: ProgressBar,
) -> (Vec<Contributor>, Vec<PullRequest>) {
    pb.set_message(format!("{}: fetching contributors and pull requests ...", project.slug));
    let (contributors, pull_requests) = futures::join!(
        project.fetch_contributors(client),
        project.fetch_pull_requests(client, since, until),
    );
    pb.finish_with_message(format!(
        "✅ {}: fetched {} contributors, {} pull requests",
        project.slug,
        contributors.len(),
        pull_requests.len()
    ));
    (contributors, pull_requests)
}

async fn pull_request_fetch(
    client: &GithubClient,
    config: &Config,
    aliases: &AliasResolver,
    data_analysis: &Mutex<DataAnalysis>,
    logins: &[String],
    pull_requests: &[PullRequest],
    progress: &MultiProgress,
) {
    let (since, until) = (config.start_date, config.end_date);
    let in_range = pull_requests
        .iter()
        .filter(|pull_request| pull_request.counts_in(since, until))
        .collect::<Vec<_>>();
    data_analysis.lock().await.total_pull_requests = in_range.len() as u64;

    let mut authored = Vec::new();
    for login in logins {
        let alias = aliases.resolve(login);
        let own = in_range
            .iter()
            .filter(|pull_request| pull_request.author() == Some(login.as_str()))
            .collect::<Vec<_>>();
        data_analysis
            .lock()
            .await
            .insert_pull_requests(&alias, own.len() as u64);
        authored.extend(own.into_iter().map(|pull_request| (alias.clone(), *pull_request)));
    }

    let pb = progress.add_with_style(
        ProgressBar::new(authored.len() as u64),
        ProgressStyleTemplate::number_bar(),
    );
    pb.set_message("Pull request details");
    join_all(authored.iter().map(|(alias, pull_request)| {
        pull_request_details(client, pull_request, alias, aliases, data_analysis, &pb)
    }))
    .await;
    pb.finish_with_message("✅ Pull request details");
}

async fn pull_request_details(
    client: &GithubClient,
    pull_request: &PullRequest,
    alias: &str,
    aliases: &AliasResolver,
    data_analysis: &Mutex<DataAnalysis>,
    pb: &ProgressBar,
) {
    if let Some(diff) = fetch_diff(client, pull_request).await {
        data_analysis
            .lock()
            .await
            .insert_pull_request_diff(alias, &diff);

        for review in fetch_reviews(client, pull_request).await {
            if let Some(reviewer) = review.user {
                data_analysis
                    .lock()
                    .await
                    .insert_review(&aliases.resolve(&reviewer.login));
            }
        }
    }
    pb.inc(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitError;
    use crate::git::MockGitRunner;
    use crate::github::{ClientConfig, RateLimit};
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use indexmap::IndexMap;
    use indicatif::ProgressDrawTarget;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn config(directory: &Path, projects: &[&str]) -> Config {
        let mut aliases = IndexMap::new();
        aliases.insert(
            "alice".to_string(),
            vec!["Alice Smith".to_string(), "alice-gh".to_string()],
        );
        Config {
            directory: directory.to_path_buf(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            projects: projects.iter().map(|slug| Project::parse(slug)).collect(),
            aliases,
            ignore_users: vec![],
            github_token: None,
            skip_cache: false,
            commits_per_pull_request: None,
            results_name: None,
        }
    }

    fn checkouts(names: &[&str]) -> TempDir {
        let root = tempdir().unwrap();
        for name in names {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        root
    }

    fn hidden() -> MultiProgress {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }

    fn git_history(total: &'static str, authors: &'static str) -> MockGitRunner {
        let mut git = MockGitRunner::new();
        git.expect_clone_into().never();
        git.expect_run().returning(move |_, args| {
            Ok(if args[0] == "rev-list" { total } else { authors }.to_string())
        });
        git
    }

    fn client(server: &MockServer, cache_dir: &Path) -> GithubClient {
        let fast = RateLimit::new(100, Duration::from_millis(1));
        GithubClient::new(ClientConfig {
            base_url: server.base_url(),
            general_limit: fast,
            search_limit: fast,
            ..ClientConfig::new("secret", cache_dir, false)
        })
        .unwrap()
    }

    #[tokio::test]
    async fn local_history_alone_without_a_client() {
        let root = checkouts(&["widgets"]);
        let config = config(root.path(), &["acme/widgets"]);
        let git = Arc::new(git_history("3\n", "Alice Smith\ncarol\nalice-gh"));

        let result = gather(&config, git, None, &hidden()).await;

        assert_eq!(result.total_commits, 3);
        assert_eq!(result.total_pull_requests, 0);
        assert_eq!(result.per_repository["acme/widgets"].commits, 3);
        let alice = result.users.iter().find(|u| u.name == "alice").unwrap();
        assert_eq!((alice.commits, alice.pull_requests), (2, 0));
        assert_eq!(result.users.len(), 2);
    }

    #[tokio::test]
    async fn failing_repository_does_not_stop_the_others() {
        let root = checkouts(&["widgets", "broken"]);
        let config = config(root.path(), &["acme/widgets", "acme/broken"]);
        let mut git = MockGitRunner::new();
        git.expect_clone_into().never();
        git.expect_run()
            .withf(|dir, _| dir.ends_with("broken"))
            .returning(|_, args| {
                Err(GitError::Spawn {
                    args: args.join(" "),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "git"),
                })
            });
        git.expect_run()
            .withf(|dir, _| dir.ends_with("widgets"))
            .returning(|_, args| {
                Ok(if args[0] == "rev-list" { "2" } else { "bob\nbob" }.to_string())
            });

        let result = gather(&config, Arc::new(git), None, &hidden()).await;

        assert_eq!(result.total_commits, 2);
        assert_eq!(result.per_repository["acme/broken"].commits, 0);
        assert_eq!(result.per_repository["acme/widgets"].commits, 2);
        assert_eq!(result.users[0].name, "bob");
    }

    #[tokio::test]
    async fn merges_local_and_remote_facts_per_user() {
        let server = MockServer::start_async().await;
        let pull = server.url("/repos/acme/widgets/pulls/1");
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widgets/contributors");
                then.status(200)
                    .json_body(json!([{ "login": "alice-gh" }, { "login": "bob" }, { "login": "alice-gh" }]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/search/issues");
                then.status(200).json_body(json!({
                    "items": [
                        {
                            "user": { "login": "alice-gh" },
                            "created_at": "2024-01-10T12:00:00Z",
                            "pull_request": { "url": pull }
                        },
                        {
                            "user": { "login": "alice-gh" },
                            "created_at": "2024-01-11T12:00:00Z",
                            "draft": true,
                            "pull_request": { "url": server.url("/repos/acme/widgets/pulls/2") }
                        },
                        {
                            "user": { "login": "bob" },
                            "created_at": "2023-12-31T23:00:00Z",
                            "pull_request": { "url": server.url("/repos/acme/widgets/pulls/3") }
                        }
                    ]
                }));
            })
            .await;
        let diff = server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widgets/pulls/1");
                then.status(200)
                    .json_body(json!({ "additions": 10, "deletions": 5, "changed_files": 3 }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/widgets/pulls/1/reviews");
                then.status(200).json_body(json!([
                    { "user": { "login": "bob" } },
                    { "user": null },
                    { "user": { "login": "Bob" } }
                ]));
            })
            .await;
        let cache = tempdir().unwrap();
        let client = client(&server, cache.path());
        let root = checkouts(&["widgets"]);
        let config = config(root.path(), &["acme/widgets"]);
        let git = Arc::new(git_history("3", "Alice Smith\nAlice Smith\ncarol"));

        let result = gather(&config, git, Some(&client), &hidden()).await;

        diff.assert_hits_async(1).await;
        assert_eq!(result.total_pull_requests, 1);
        assert_eq!(result.commits_per_pull_request, 3.0);
        let names: Vec<_> = result.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);

        let alice = &result.users[0];
        assert_eq!(
            (alice.commits, alice.pull_requests, alice.loc, alice.files_touched),
            (2, 1, 15, 3)
        );
        let bob = &result.users[1];
        assert_eq!((bob.pull_requests, bob.reviews), (0, 2));
        assert_eq!(result.active_users, 3);
    }
}
