use std::path::{Path, PathBuf};

const CLONE_HOST: &str = "git@github.com";

/// A configured repository, written as `owner/name`, `@owner/name` or bare `name`.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Project {
    pub slug: String,
    pub owner: Option<String>,
    pub name: String,
}

// Create
impl Project {
    pub fn parse(slug: &str) -> Self {
        let trimmed = slug.trim().trim_start_matches('@');
        let (owner, name) = match trimmed.split_once('/') {
            Some((owner, name)) if !owner.is_empty() => (Some(owner.to_string()), name),
            Some((_, name)) => (None, name),
            None => (None, trimmed),
        };
        Self {
            slug: slug.to_string(),
            owner,
            name: name.trim_end_matches(".git").to_string(),
        }
    }
}

impl Project {
    /// Path segment used by the API: `owner/name` or `name`.
    pub fn api_path(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{owner}/{}", self.name),
            None => self.name.clone(),
        }
    }

    pub fn clone_url(&self) -> String {
        format!("{CLONE_HOST}:{}.git", self.api_path())
    }

    pub fn local_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.name)
    }
}
