use crate::error::GitError;
use crate::git::GitRunner;
use crate::model::Project;
use std::path::{Path, PathBuf};
use tracing::info;

pub trait GitRepository {
    fn repo_exists(&self, root: &Path) -> bool;

    /// Makes sure a checkout exists under `root`, cloning it when absent.
    async fn discover(&self, root: &Path, git: &dyn GitRunner) -> Result<PathBuf, GitError>;
}

impl GitRepository for Project {
    fn repo_exists(&self, root: &Path) -> bool {
        self.local_dir(root).is_dir()
    }

    async fn discover(&self, root: &Path, git: &dyn GitRunner) -> Result<PathBuf, GitError> {
        let path = self.local_dir(root);
        if self.repo_exists(root) {
            info!(project = %self.slug, "Project was discovered");
            return Ok(path);
        }
        info!(project = %self.slug, url = %self.clone_url(), "Cloning project");
        git.clone_into(&self.clone_url(), &path).await?;
        Ok(path)
    }
}
