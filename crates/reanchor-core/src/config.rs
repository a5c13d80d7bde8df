//! Provider configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::scm::detect_git_root;

pub const REPO_ROOT_ENV: &str = "REANCHOR_REPO_ROOT";

/// Labels for the draft review actions offered by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DraftLabels {
    pub start: String,
    pub delete: String,
    pub finish: String,
}

impl Default for DraftLabels {
    fn default() -> Self {
        Self {
            start: "Start Review".to_string(),
            delete: "Delete Review".to_string(),
            finish: "Submit Review".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Root of the working copy; `file:` documents are resolved against it.
    pub repository_root: PathBuf,
    pub draft_labels: DraftLabels,
}

impl ProviderConfig {
    #[must_use]
    pub fn new(repository_root: impl Into<PathBuf>) -> Self {
        Self {
            repository_root: repository_root.into(),
            ..Self::default()
        }
    }

    /// Defaults with `REANCHOR_REPO_ROOT` applied when set.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = std::env::var_os(REPO_ROOT_ENV).filter(|v| !v.is_empty()) {
            config.repository_root = PathBuf::from(root);
        }
        config
    }

    /// Repository-relative path of a file under the root, with `/` separators.
    #[must_use]
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.repository_root).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

/// Resolve the repository root: explicit value, then `REANCHOR_REPO_ROOT`,
/// then the enclosing git repository, then `start` itself.
#[must_use]
pub fn resolve_repo_root(explicit: Option<&Path>, start: &Path) -> PathBuf {
    if let Some(root) = explicit {
        return root.to_path_buf();
    }

    if let Some(root) = std::env::var_os(REPO_ROOT_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(root);
    }

    detect_git_root(start).unwrap_or_else(|| start.to_path_buf())
}
