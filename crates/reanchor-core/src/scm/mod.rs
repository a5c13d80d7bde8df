//! Source control access needed to anchor comments in the working copy.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::{Component, Path};

pub mod git;

pub use git::{detect_git_root, GitDiffProvider};

/// Target side of a file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Commit(String),
    /// The file as it is on disk.
    WorkingTree,
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit(commit) => f.write_str(commit),
            Self::WorkingTree => f.write_str("working tree"),
        }
    }
}

/// Produces unified diffs and blob ids for single files.
#[async_trait]
pub trait DiffProvider: Send + Sync {
    /// Unified diff of `path` from commit `from` to `to`.
    async fn diff_between(&self, from: &str, to: &Revision, path: &str) -> Result<String>;

    /// Unified diff between two blobs.
    async fn diff_blobs(&self, old_blob: &str, new_blob: &str) -> Result<String>;

    /// Store `text` as a blob and return its id.
    async fn hash_content(&self, text: &str) -> Result<String>;

    /// Blob id of `path` at `commit`.
    async fn blob_id_at(&self, commit: &str, path: &str) -> Result<String>;
}

pub fn validate_ref(reference: &str) -> Result<()> {
    if reference.trim().is_empty() {
        bail!("Commit or blob reference cannot be empty");
    }

    if reference.starts_with('-') {
        bail!("Commit or blob reference cannot start with '-': {reference}");
    }

    if reference.contains('\0') || reference.contains('\n') || reference.contains('\r') {
        bail!("Commit or blob reference contains invalid control characters");
    }

    Ok(())
}

pub fn validate_repo_relative_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        bail!("Path cannot be empty");
    }

    let path_ref = Path::new(path);
    if path_ref.is_absolute() {
        bail!("Path must be repository-relative: {path}");
    }

    for component in path_ref.components() {
        match component {
            Component::Normal(_) => {}
            Component::CurDir => bail!("Path must be normalized (no '.'): {path}"),
            Component::ParentDir => bail!("Path traversal is not allowed: {path}"),
            Component::RootDir | Component::Prefix(_) => {
                bail!("Path must be repository-relative: {path}")
            }
        }
    }

    Ok(())
}
