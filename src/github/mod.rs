pub mod cache;
pub mod client;
pub mod paginator;
pub mod pull_request;
pub mod rate_limiter;

pub use client::{ApiResponse, ClientConfig, GithubClient};
pub use pull_request::{Contributor, GithubPullRequester, PullRequest, PullRequestDiff, Review};
pub use rate_limiter::{RateLimit, RateLimiter};
