use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::scm::{validate_ref, validate_repo_relative_path, DiffProvider, Revision};

/// Diff provider backed by the `git` binary.
#[derive(Debug, Clone)]
pub struct GitDiffProvider {
    root: PathBuf,
}

impl GitDiffProvider {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run_git(&self, args: &[&str], input: Option<&str>) -> Result<String> {
        let mut child = Command::new("git")
            .current_dir(&self.root)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                if let Err(e) = which::which("git") {
                    format!("git command not found. Please install git: {e}")
                } else {
                    format!("Failed to execute git command: {args:?}")
                }
            })?;

        if let (Some(text), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin
                .write_all(text.as_bytes())
                .await
                .context("Failed to write to git stdin")?;
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for git command: {args:?}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "git command failed with status {}: {}",
                output.status,
                stderr.trim()
            );
        }

        String::from_utf8(output.stdout).context("git output was not valid UTF-8")
    }
}

#[must_use]
pub fn detect_git_root(start_path: &Path) -> Option<PathBuf> {
    let output = std::process::Command::new("git")
        .current_dir(start_path)
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8(output.stdout).ok()?;
    let root = stdout.trim();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

#[async_trait]
impl DiffProvider for GitDiffProvider {
    async fn diff_between(&self, from: &str, to: &Revision, path: &str) -> Result<String> {
        validate_ref(from)?;
        validate_repo_relative_path(path)?;
        match to {
            Revision::WorkingTree => self
                .run_git(&["diff", "--no-color", from, "--", path], None)
                .await
                .with_context(|| format!("Failed to diff {path} from {from} to the working tree")),
            Revision::Commit(to) => {
                validate_ref(to)?;
                let range = format!("{from}..{to}");
                self.run_git(&["diff", "--no-color", &range, "--", path], None)
                    .await
                    .with_context(|| format!("Failed to diff {path} from {from} to {to}"))
            }
        }
    }

    async fn diff_blobs(&self, old_blob: &str, new_blob: &str) -> Result<String> {
        validate_ref(old_blob)?;
        validate_ref(new_blob)?;
        self.run_git(&["diff", "--no-color", old_blob, new_blob], None)
            .await
            .with_context(|| format!("Failed to diff blobs {old_blob} and {new_blob}"))
    }

    async fn hash_content(&self, text: &str) -> Result<String> {
        let output = self
            .run_git(&["hash-object", "-w", "--stdin"], Some(text))
            .await
            .context("Failed to hash buffer contents")?;
        Ok(output.trim().to_string())
    }

    async fn blob_id_at(&self, commit: &str, path: &str) -> Result<String> {
        validate_ref(commit)?;
        validate_repo_relative_path(path)?;
        let object = format!("{commit}:{path}");
        let output = self
            .run_git(&["rev-parse", "--verify", "--end-of-options", &object], None)
            .await
            .with_context(|| format!("Failed to resolve blob for {path} at {commit}"))?;
        Ok(output.trim().to_string())
    }
}
