pub mod commit;
pub mod repository;
pub mod runner;

pub use commit::{CommitStats, GitCommitRepository};
pub use repository::GitRepository;
#[cfg(test)]
pub use runner::MockGitRunner;
pub use runner::{GitRunner, SystemGit};
