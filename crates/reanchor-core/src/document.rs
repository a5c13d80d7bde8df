//! Documents and document URIs.
//!
//! URIs have the form `scheme:path?query`. Diff-view URIs carry a JSON query:
//!
//! ```text
//! review:src/lib.rs?{"path":"src/lib.rs","commit":"abc123","base":false}
//! pr:src/lib.rs?{"base":true}
//! file:/home/me/repo/src/lib.rs
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::DiffSide;

#[derive(Debug, Error)]
pub enum UriError {
    #[error("Missing scheme in document URI: {uri}")]
    MissingScheme { uri: String },

    #[error("Unsupported document URI scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("Missing query in {scheme} URI: {uri}")]
    MissingQuery { scheme: String, uri: String },

    #[error("Invalid query in document URI: {0}")]
    InvalidQuery(#[from] serde_json::Error),
}

/// Query of a `review:` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQuery {
    pub path: String,
    pub commit: String,
    #[serde(default)]
    pub base: bool,
    #[serde(default)]
    pub is_outdated: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PullRequestQuery {
    #[serde(default)]
    base: bool,
}

/// What a document shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentUri {
    /// One side of the pull request diff when the branch is not checked out.
    PullRequest { path: String, base: bool },
    /// One side of a commit diff.
    Review(ReviewQuery),
    /// A live file in the working copy.
    File { path: PathBuf },
}

impl DocumentUri {
    /// Side of the diff this document shows. Live files show the head side.
    #[must_use]
    pub const fn side(&self) -> DiffSide {
        match self {
            Self::PullRequest { base, .. } => DiffSide::from_base(*base),
            Self::Review(query) => DiffSide::from_base(query.base),
            Self::File { .. } => DiffSide::Head,
        }
    }
}

impl FromStr for DocumentUri {
    type Err = UriError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = uri.split_once(':').ok_or_else(|| UriError::MissingScheme {
            uri: uri.to_string(),
        })?;
        let rest = rest.strip_prefix("//").unwrap_or(rest);
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (rest, None),
        };

        match scheme {
            "review" => {
                let query = query.ok_or_else(|| UriError::MissingQuery {
                    scheme: scheme.to_string(),
                    uri: uri.to_string(),
                })?;
                Ok(Self::Review(serde_json::from_str(query)?))
            }
            "pr" => {
                let query: PullRequestQuery = match query {
                    Some(q) if !q.is_empty() => serde_json::from_str(q)?,
                    _ => PullRequestQuery::default(),
                };
                Ok(Self::PullRequest {
                    path: path.to_string(),
                    base: query.base,
                })
            }
            "file" => Ok(Self::File {
                path: PathBuf::from(path),
            }),
            other => Err(UriError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for DocumentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PullRequest { path, base } => {
                let query = serde_json::json!({ "base": base });
                write!(f, "pr:{path}?{query}")
            }
            Self::Review(query) => {
                let json = serde_json::to_string(query).map_err(|_| fmt::Error)?;
                write!(f, "review:{}?{json}", query.path)
            }
            Self::File { path } => write!(f, "file:{}", path.display()),
        }
    }
}

/// An open document as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uri: DocumentUri,
    /// Current buffer text.
    pub text: String,
    /// Whether the buffer has unsaved edits.
    pub is_dirty: bool,
}

impl Document {
    #[must_use]
    pub fn new(uri: DocumentUri, text: impl Into<String>) -> Self {
        Self {
            uri,
            text: text.into(),
            is_dirty: false,
        }
    }

    #[must_use]
    pub const fn dirty(mut self) -> Self {
        self.is_dirty = true;
        self
    }
}
