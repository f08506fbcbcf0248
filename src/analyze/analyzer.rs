use crate::analyze::DataAnalysis;
use crate::model::{RunResult, UserRecord};

const LARGE_LOC: u64 = 1_000_000;

pub trait Analyzer {
    /// Scores every user, derives the team figures, drops ignored users and
    /// ranks the rest by score.
    fn analyze(&self, commits_per_pull_request: Option<f64>, ignore_users: &[String]) -> RunResult;
}

impl Analyzer for DataAnalysis {
    fn analyze(&self, commits_per_pull_request: Option<f64>, ignore_users: &[String]) -> RunResult {
        let total_commits = self.total_commits as f64;
        let measured_ratio = if self.total_commits > 0 && self.total_pull_requests > 0 {
            total_commits / self.total_pull_requests as f64
        } else {
            0.0
        };
        let predicted_pull_requests = match commits_per_pull_request {
            Some(configured) if configured != 0.0 => total_commits / configured,
            _ => ratio(total_commits, measured_ratio),
        };

        let mut users = self
            .users
            .iter()
            .map(|(name, user)| {
                let mut user = user.clone();
                user.name = name.clone();
                user.score = score(&user, measured_ratio);
                user
            })
            .collect::<Vec<_>>();

        let mut active_users = users.iter().filter(|user| user.score > 0.0).count() as u64;
        let team_score = if active_users > 0 {
            users.iter().map(|user| user.score).sum::<f64>() / active_users as f64
        } else {
            0.0
        };

        for ignored in ignore_users {
            let ignored = ignored.to_lowercase();
            if let Some(index) = users.iter().position(|user| user.name == ignored) {
                if users.remove(index).score > 0.0 {
                    active_users = active_users.saturating_sub(1);
                }
            }
        }
        users.sort_by(|a, b| b.score.total_cmp(&a.score));

        RunResult {
            report_info: self.report_info.clone(),
            total_commits: self.total_commits,
            total_pull_requests: self.total_pull_requests,
            commits_per_pull_request: measured_ratio,
            predicted_pull_requests,
            active_users,
            team_score,
            users,
            per_repository: self.per_repository.clone(),
        }
    }
}

pub fn score(user: &UserRecord, commits_per_pull_request: f64) -> f64 {
    let loc = user.loc as f64;
    let loc_score = if user.loc > LARGE_LOC { loc / 800.0 } else { loc / 100.0 };
    loc_score
        + user.files_touched as f64 / 100.0
        + user.pull_requests as f64 * 15.0
        + user.commits as f64 / 100.0
        + ratio(user.commits as f64, commits_per_pull_request) * 10.0
        + user.reviews as f64 * 10.0
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReportInfo, UserRecord};
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn analysis(total_commits: u64, total_pull_requests: u64, users: Vec<UserRecord>) -> DataAnalysis {
        DataAnalysis {
            report_info: ReportInfo {
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            },
            total_commits,
            total_pull_requests,
            per_repository: IndexMap::new(),
            users: users.into_iter().map(|user| (user.name.clone(), user)).collect(),
        }
    }

    fn user(name: &str, commits: u64, pull_requests: u64, loc: u64, files_touched: u64, reviews: u64) -> UserRecord {
        UserRecord {
            commits,
            pull_requests,
            loc,
            files_touched,
            reviews,
            ..UserRecord::new(name)
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn scores_the_reference_scenario() {
        let result = analysis(250, 10, vec![user("alice", 100, 2, 500, 5, 1)]).analyze(None, &[]);

        assert_eq!(result.commits_per_pull_request, 25.0);
        assert_eq!(result.predicted_pull_requests, 10.0);
        assert!(close(result.users[0].score, 86.05), "{}", result.users[0].score);
    }

    #[test]
    fn large_change_sets_are_damped() {
        let huge = user("big", 0, 0, 2_000_000, 0, 0);
        assert!(close(score(&huge, 0.0), 2500.0));
        let edge = user("edge", 0, 0, 1_000_000, 0, 0);
        assert!(close(score(&edge, 0.0), 10_000.0));
    }

    #[test]
    fn idle_users_score_zero_and_are_not_active() {
        let result = analysis(0, 0, vec![user("idle", 0, 0, 0, 0, 0)]).analyze(None, &[]);

        assert_eq!(result.users[0].score, 0.0);
        assert_eq!(result.active_users, 0);
        assert_eq!(result.team_score, 0.0);
        assert_eq!(result.commits_per_pull_request, 0.0);
        assert_eq!(result.predicted_pull_requests, 0.0);
    }

    #[test]
    fn team_score_is_the_mean_over_active_users() {
        let result = analysis(
            0,
            0,
            vec![
                user("a", 0, 1, 0, 0, 0),
                user("b", 0, 0, 0, 0, 3),
                user("c", 0, 0, 0, 0, 0),
            ],
        )
        .analyze(None, &[]);

        assert_eq!(result.active_users, 2);
        let sum: f64 = result.users.iter().map(|u| u.score).sum();
        assert!(close(result.team_score, sum / 2.0));
        assert!(close(result.team_score, 22.5));
    }

    #[test]
    fn reviewer_without_pull_requests_is_ranked() {
        let result = analysis(10, 2, vec![user("reviewer", 0, 0, 0, 0, 2)]).analyze(None, &[]);

        let reviewer = &result.users[0];
        assert_eq!(reviewer.pull_requests, 0);
        assert!(close(reviewer.score, 20.0));
        assert_eq!(result.active_users, 1);
    }

    #[test]
    fn ignored_users_leave_the_ranking() {
        let result = analysis(
            0,
            0,
            vec![
                user("bot", 0, 2, 0, 0, 0),
                user("alice", 0, 1, 0, 0, 0),
                user("ghost", 0, 0, 0, 0, 0),
            ],
        )
        .analyze(None, &["BOT".to_string(), "ghost".to_string(), "absent".to_string()]);

        assert_eq!(result.active_users, 1);
        assert_eq!(result.users.len(), 1);
        assert_eq!(result.users[0].name, "alice");
    }

    #[test]
    fn ignoring_a_scored_user_drops_exactly_one_active_user() {
        let data = analysis(0, 0, vec![user("x", 0, 2, 1200, 0, 0), user("y", 0, 1, 0, 0, 0)]);
        let before = data.analyze(None, &[]);
        let after = data.analyze(None, &["x".to_string()]);

        assert!(close(before.users[0].score, 42.0));
        assert_eq!(after.active_users, before.active_users - 1);
        assert!(after.users.iter().all(|u| u.name != "x"));
    }

    #[test]
    fn sorts_by_score_keeping_insertion_order_on_ties() {
        let result = analysis(
            0,
            0,
            vec![
                user("first", 0, 1, 0, 0, 0),
                user("top", 0, 3, 0, 0, 0),
                user("second", 0, 1, 0, 0, 0),
            ],
        )
        .analyze(None, &[]);

        let names: Vec<_> = result.users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["top", "first", "second"]);
    }

    #[test]
    fn configured_ratio_drives_the_prediction() {
        let data = analysis(120, 10, vec![]);
        assert_eq!(data.analyze(Some(4.0), &[]).predicted_pull_requests, 30.0);
        assert_eq!(data.analyze(Some(0.0), &[]).predicted_pull_requests, 10.0);
    }
}
