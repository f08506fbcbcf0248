use crate::error::GitError;
use async_trait::async_trait;
use git2::build::RepoBuilder;
use git2::{Config, FetchOptions, RemoteCallbacks};
use git2_credentials::CredentialHandler;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, trace};

#[cfg(test)]
use mockall::automock;

/// Local git facility: history queries through the `git` binary and clones.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Runs `git <args>` inside `dir` and returns its standard output.
    async fn run(&self, dir: &Path, args: &[String]) -> Result<String, GitError>;

    async fn clone_into(&self, url: &str, dest: &Path) -> Result<(), GitError>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemGit;

#[async_trait]
impl GitRunner for SystemGit {
    async fn run(&self, dir: &Path, args: &[String]) -> Result<String, GitError> {
        let joined = args.join(" ");
        debug!(dir = %dir.display(), args = %joined, "Running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|source| GitError::Spawn {
                args: joined.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(GitError::Command {
                args: joined,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn clone_into(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        let url = url.to_string();
        let dest = dest.to_path_buf();
        tokio::task::spawn_blocking(move || repo_clone(&url, &dest)).await??;
        Ok(())
    }
}

fn repo_clone(url: &str, dest: &Path) -> Result<(), git2::Error> {
    let git_config = Config::open_default()?;
    let mut credential_handler = CredentialHandler::new(git_config);

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username, allowed| {
        credential_handler.try_next_credential(url, username, allowed)
    });
    callbacks.transfer_progress(|stats| {
        trace!(
            received = stats.received_objects(),
            total = stats.total_objects(),
            "Clone progress"
        );
        true
    });

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);

    RepoBuilder::new()
        .fetch_options(options)
        .clone(url, dest)
        .map(|_| ())
}
