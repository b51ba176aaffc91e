//! Project root and migrations directory discovery.
//!
//! Sources are checked in order: an explicit `SCRY_PROJECT_ROOT` override,
//! the GitHub Actions workspace (including monorepo checkouts), the GitLab CI
//! project directory, and finally an upward walk from the working directory.

use crate::{ci, env::Environment};
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PROJECT_ROOT: &str = "SCRY_PROJECT_ROOT";

/// Marker that identifies a project root.
pub const PRIMARY_MARKER: &str = "Cargo.toml";
/// Accepted during traversal when no primary marker is found first.
pub const SECONDARY_MARKER: &str = ".git";

pub const MIGRATIONS_DIR: &str = "migrations";
pub const MIGRATION_TABLE_NAME: &str = "_sqlx_migrations";

const MAX_DEPTH: usize = 10;
const DEFAULT_REPOSITORY: &str = "scry-api";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to get current working directory: {0}")]
    CurrentDir(#[source] io::Error),
    #[error("invalid project root from {source_var}: no Cargo.toml at {}", .path.display())]
    InvalidRoot { source_var: String, path: PathBuf },
    #[error("unable to find project root from {} within {depth} levels", .start.display())]
    NotFound { start: PathBuf, depth: usize },
    #[error("migrations directory not found at {}", .0.display())]
    MigrationsNotFound(PathBuf),
}

/// Locates the project root for an environment.
#[derive(Debug, Clone)]
pub struct ProjectRoot<'a> {
    env: &'a Environment,
    start: Option<PathBuf>,
    max_depth: usize,
}

impl<'a> ProjectRoot<'a> {
    #[must_use]
    pub const fn new(env: &'a Environment) -> Self {
        Self {
            env,
            start: None,
            max_depth: MAX_DEPTH,
        }
    }

    /// Start traversal from `dir` instead of the working directory.
    #[must_use]
    pub fn starting_at(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Find the project root.
    ///
    /// # Errors
    /// Returns an error if an explicit override points at a directory without
    /// the primary marker, or if traversal finds no marker.
    pub fn find(&self) -> Result<PathBuf, ProjectError> {
        if let Some(root) = self.env.get(PROJECT_ROOT) {
            info!(project_root = root, "using project root from SCRY_PROJECT_ROOT");
            return validated(PROJECT_ROOT, Path::new(root));
        }

        if ci::is_github_actions(self.env)
            && let Some(root) = self.from_github_workspace()
        {
            return Ok(root);
        }

        if ci::is_gitlab_ci(self.env)
            && let Some(dir) = self.env.get(ci::GITLAB_PROJECT_DIR)
        {
            info!(project_dir = dir, "using project root from GitLab CI project directory");
            return validated(ci::GITLAB_PROJECT_DIR, Path::new(dir));
        }

        let start = match &self.start {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(ProjectError::CurrentDir)?,
        };
        info!(start = %start.display(), "no project root variables set, auto-detecting");
        traverse(&start, self.max_depth)
    }

    /// `<root>/migrations`, which must exist.
    ///
    /// # Errors
    /// Returns an error if the root cannot be found or has no migrations directory.
    pub fn migrations_dir(&self) -> Result<PathBuf, ProjectError> {
        let root = self.find()?;
        let path = root.join(MIGRATIONS_DIR);
        debug!(project_root = %root.display(), migrations = %path.display(), "resolved migrations directory");
        if path.is_dir() {
            Ok(path)
        } else {
            Err(ProjectError::MigrationsNotFound(path))
        }
    }

    fn from_github_workspace(&self) -> Option<PathBuf> {
        let workspace = Path::new(self.env.get(ci::GITHUB_WORKSPACE)?);
        if is_valid_root(workspace) {
            info!(workspace = %workspace.display(), "project root found at GitHub workspace root");
            return Some(workspace.to_path_buf());
        }

        let repository = self.repository_name();
        let candidates = [workspace.join(&repository), workspace.join("src").join(&repository)];
        if let Some(found) = candidates.into_iter().find(|path| is_valid_root(path)) {
            info!(project_root = %found.display(), "project root found in repository subdirectory");
            return Some(found);
        }

        warn!(
            workspace = %workspace.display(),
            repository = %repository,
            "GitHub workspace does not contain a project root, falling back"
        );
        None
    }

    fn repository_name(&self) -> String {
        if let Some(full) = self.env.get(ci::GITHUB_REPOSITORY)
            && let Some((_, name)) = full.split_once('/')
            && !name.is_empty()
        {
            return name.to_string();
        }
        self.env
            .get(ci::GITLAB_PROJECT_NAME)
            .unwrap_or(DEFAULT_REPOSITORY)
            .to_string()
    }
}

fn validated(source_var: &str, path: &Path) -> Result<PathBuf, ProjectError> {
    if is_valid_root(path) {
        Ok(path.to_path_buf())
    } else {
        Err(ProjectError::InvalidRoot {
            source_var: source_var.to_string(),
            path: path.to_path_buf(),
        })
    }
}

fn is_valid_root(path: &Path) -> bool {
    path.is_dir() && path.join(PRIMARY_MARKER).is_file()
}

fn traverse(start: &Path, max_depth: usize) -> Result<PathBuf, ProjectError> {
    let mut current = start;
    for depth in 1..=max_depth {
        debug!(dir = %current.display(), depth, "checking directory for project markers");

        if current.join(PRIMARY_MARKER).is_file() {
            info!(project_root = %current.display(), "found project root with Cargo.toml");
            return Ok(current.to_path_buf());
        }
        if current.join(SECONDARY_MARKER).is_dir() {
            info!(project_root = %current.display(), "found potential project root with .git directory");
            return Ok(current.to_path_buf());
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    Err(ProjectError::NotFound {
        start: start.to_path_buf(),
        depth: max_depth,
    })
}
