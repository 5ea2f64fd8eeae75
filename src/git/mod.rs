//! External repository checkout
//!
//! The dependency stack's compose files live in a third-party repository.
//! Only a sparse subset of it is checked out: the first run clones without
//! blobs and restricts the working tree, later runs just pull.

use crate::error::{DockyardError, Result};
use crate::runtime::{CommandRunner, Invocation};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Remote repository to keep checked out locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Clone URL
    pub url: String,
    /// Local checkout directory, relative to the working directory
    pub path: PathBuf,
    /// Directories kept by the cone-mode sparse checkout
    pub sparse_paths: Vec<String>,
    /// Branch checked out after cloning
    pub branch: String,
    /// Partial clone filter passed to `--filter`
    pub filter: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: "https://github.com/supabase/supabase.git".to_string(),
            path: PathBuf::from("supabase"),
            sparse_paths: vec!["docker".to_string()],
            branch: "master".to_string(),
            filter: Some("blob:none".to_string()),
        }
    }
}

/// What [`GitClient::ensure`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkout {
    /// The repository was cloned fresh
    Cloned,
    /// An existing checkout was updated in place
    Updated,
}

/// Drives the `git` CLI
pub struct GitClient<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    git: String,
    root: PathBuf,
}

impl<'a, R: CommandRunner + ?Sized> GitClient<'a, R> {
    /// Create a client that resolves repository paths against `root`
    pub fn new(runner: &'a R, git: &str, root: &Path) -> Self {
        Self {
            runner,
            git: git.to_string(),
            root: root.to_path_buf(),
        }
    }

    /// Clone the repository if it is missing, otherwise pull it
    pub fn ensure(&self, repo: &RepositoryConfig) -> Result<Checkout> {
        let dir = self.root.join(&repo.path);

        if dir.exists() {
            if !dir.is_dir() {
                return Err(DockyardError::RepositoryPath(dir));
            }
            tracing::info!(
                "Repository {} already exists, updating...",
                repo.path.display()
            );
            self.runner.run(&self.pull_invocation(repo))?;
            return Ok(Checkout::Updated);
        }

        tracing::info!("Cloning {} into {}...", repo.url, repo.path.display());
        for inv in self.clone_invocations(repo) {
            self.runner.run(&inv)?;
        }
        Ok(Checkout::Cloned)
    }

    /// The commands that produce a fresh sparse checkout
    pub fn clone_invocations(&self, repo: &RepositoryConfig) -> Vec<Invocation> {
        let dir = self.root.join(&repo.path);

        let mut clone = Invocation::new(&self.git).arg("clone");
        if let Some(ref filter) = repo.filter {
            clone = clone.arg(format!("--filter={}", filter));
        }
        let clone = clone
            .arg("--no-checkout")
            .arg(repo.url.as_str())
            .arg(repo.path.to_string_lossy())
            .cwd(&self.root);

        vec![
            clone,
            Invocation::new(&self.git)
                .args(["sparse-checkout", "init", "--cone"])
                .cwd(&dir),
            Invocation::new(&self.git)
                .args(["sparse-checkout", "set"])
                .args(repo.sparse_paths.iter().cloned())
                .cwd(&dir),
            Invocation::new(&self.git)
                .args(["checkout", repo.branch.as_str()])
                .cwd(&dir),
        ]
    }

    /// The command that refreshes an existing checkout
    pub fn pull_invocation(&self, repo: &RepositoryConfig) -> Invocation {
        Invocation::new(&self.git)
            .arg("pull")
            .cwd(&self.root.join(&repo.path))
    }
}
