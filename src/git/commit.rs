use crate::error::GitError;
use crate::git::GitRunner;
use crate::model::AliasResolver;
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::path::Path;

/// Commits found in one checkout for the reporting window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitStats {
    pub total: u64,
    /// Commit counts keyed by canonical author.
    pub by_author: IndexMap<String, u64>,
}

pub trait GitCommitRepository {
    async fn count_commits(
        &self,
        repo_dir: &Path,
        since: NaiveDate,
        until: NaiveDate,
        aliases: &AliasResolver,
    ) -> Result<CommitStats, GitError>;
}

impl<G: GitRunner + ?Sized> GitCommitRepository for G {
    async fn count_commits(
        &self,
        repo_dir: &Path,
        since: NaiveDate,
        until: NaiveDate,
        aliases: &AliasResolver,
    ) -> Result<CommitStats, GitError> {
        let total = self.run(repo_dir, &total_args(since, until)).await?;
        let authors = self.run(repo_dir, &author_args(since, until)).await?;
        Ok(CommitStats {
            total: parse_count(&total),
            by_author: count_authors(&authors, aliases),
        })
    }
}

// Totals stop at the first instant of the end date, per-author at its last second.
fn total_args(since: NaiveDate, until: NaiveDate) -> Vec<String> {
    vec![
        "rev-list".to_string(),
        "--count".to_string(),
        format!("--since={since}T00:00:00-00:00"),
        format!("--until={until}T00:00:00-00:00"),
        "HEAD".to_string(),
    ]
}

fn author_args(since: NaiveDate, until: NaiveDate) -> Vec<String> {
    vec![
        "log".to_string(),
        format!("--since={since}T00:00:00-00:00"),
        format!("--until={until}T23:59:59-00:00"),
        "--pretty=format:%an".to_string(),
    ]
}

fn parse_count(output: &str) -> u64 {
    output.trim().parse().unwrap_or(0)
}

fn count_authors(output: &str, aliases: &AliasResolver) -> IndexMap<String, u64> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .fold(IndexMap::new(), |mut acc, author| {
            *acc.entry(aliases.resolve(author)).or_insert(0) += 1;
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockGitRunner;
    use std::path::PathBuf;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn aliases() -> AliasResolver {
        let mut map = IndexMap::new();
        map.insert("alice".to_string(), vec!["Alice Smith".to_string()]);
        AliasResolver::new(&map)
    }

    #[test]
    fn history_queries_use_asymmetric_bounds() {
        let (since, until) = (date(2024, 3, 1), date(2024, 3, 31));
        assert_eq!(
            total_args(since, until)[2..4],
            [
                "--since=2024-03-01T00:00:00-00:00",
                "--until=2024-03-31T00:00:00-00:00"
            ]
        );
        assert_eq!(
            author_args(since, until)[1..3],
            [
                "--since=2024-03-01T00:00:00-00:00",
                "--until=2024-03-31T23:59:59-00:00"
            ]
        );
    }

    #[test]
    fn non_numeric_count_is_zero() {
        assert_eq!(parse_count("42\n"), 42);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("fatal: bad revision"), 0);
    }

    #[test]
    fn authors_are_counted_under_their_alias() {
        let counts = count_authors("Alice Smith\nbob\nalice\n\nBob\n", &aliases());
        assert_eq!(counts.get("alice"), Some(&2));
        assert_eq!(counts.get("bob"), Some(&2));
        assert_eq!(counts.len(), 2);
        assert!(count_authors("", &aliases()).is_empty());
    }

    #[tokio::test]
    async fn counts_commits_through_the_runner() {
        let mut git = MockGitRunner::new();
        git.expect_run()
            .withf(|dir, args| dir == Path::new("/src/widgets") && args[0] == "rev-list")
            .times(1)
            .returning(|_, _| Ok("3\n".to_string()));
        git.expect_run()
            .withf(|_, args| args[0] == "log")
            .times(1)
            .returning(|_, _| Ok("Alice Smith\nAlice Smith\ncarol".to_string()));

        let stats = git
            .count_commits(
                &PathBuf::from("/src/widgets"),
                date(2024, 1, 1),
                date(2024, 1, 31),
                &aliases(),
            )
            .await
            .unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_author.get("alice"), Some(&2));
        assert_eq!(stats.by_author.get("carol"), Some(&1));
    }
}
