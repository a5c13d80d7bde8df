//! Shared domain types: review comments, file changes, editor ranges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::{parse_hunks, DiffError, DiffHunk, LineRange};

/// Backend-assigned comment identifier. Larger ids were created later.
pub type CommentId = u64;

/// A review comment as returned by the review backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Repository-relative path of the commented file.
    pub path: String,
    /// Commit the comment was written against.
    pub original_commit_id: String,
    /// Hunk text captured when the comment was written, ending at the commented line.
    pub diff_hunk: String,
    /// Diff position at the time of writing.
    pub original_position: u32,
    /// Diff position in the current pull request diff; `None` once outdated.
    #[serde(default)]
    pub position: Option<u32>,
    pub body: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub pull_request_review_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Line in the document being viewed, set on derived copies only.
    #[serde(skip)]
    pub absolute_position: Option<u32>,
}

impl Comment {
    /// Whether the backend no longer places this comment in the current diff.
    #[must_use]
    pub const fn is_outdated(&self) -> bool {
        self.position.is_none()
    }

    /// The diff position this comment is grouped and located by.
    #[must_use]
    pub fn anchor_position(&self) -> u32 {
        self.position.unwrap_or(self.original_position)
    }

    /// Copy of this comment with its absolute position set.
    #[must_use]
    pub fn located_at(&self, line: u32) -> Self {
        Self {
            absolute_position: Some(line),
            ..self.clone()
        }
    }
}

/// The pull request the provider is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    /// Head commit of the pull request.
    pub head_sha: String,
    /// Whether the backend supports draft (pending) reviews.
    #[serde(default)]
    pub supports_drafts: bool,
}

/// A file changed by the pull request, with its diff already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileChange {
    /// Repository-relative path.
    pub path: String,
    pub head_commit: String,
    pub base_commit: String,
    pub hunks: Vec<DiffHunk>,
}

impl LocalFileChange {
    /// Build a change from the file's pull request patch.
    pub fn from_patch(
        path: impl Into<String>,
        head_commit: impl Into<String>,
        base_commit: impl Into<String>,
        patch: &str,
    ) -> Result<Self, DiffError> {
        Ok(Self {
            path: path.into(),
            head_commit: head_commit.into(),
            base_commit: base_commit.into(),
            hunks: parse_hunks(patch)?,
        })
    }

    /// Whether `commit` is this change's head or base commit.
    #[must_use]
    pub fn has_commit(&self, commit: &str) -> bool {
        self.head_commit == commit || self.base_commit == commit
    }
}

/// A changed file whose contents are not available locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileChange {
    pub path: String,
}

/// A file change in the pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Local(LocalFileChange),
    Remote(RemoteFileChange),
}

impl FileChange {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Local(change) => &change.path,
            Self::Remote(change) => &change.path,
        }
    }

    #[must_use]
    pub const fn as_local(&self) -> Option<&LocalFileChange> {
        match self {
            Self::Local(change) => Some(change),
            Self::Remote(_) => None,
        }
    }
}

/// Zero-based editor position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// Zero-based editor range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Empty range at the start of a zero-based line.
    #[must_use]
    pub const fn point(line: u32) -> Self {
        let at = Position { line, character: 0 };
        Self { start: at, end: at }
    }

    /// Range at the start of a 1-based line.
    #[must_use]
    pub const fn at_line(line: u32) -> Self {
        Self::point(line.saturating_sub(1))
    }

    /// Whole-line range between two zero-based lines.
    #[must_use]
    pub const fn lines(start: u32, end: u32) -> Self {
        Self {
            start: Position {
                line: start,
                character: 0,
            },
            end: Position {
                line: end,
                character: 0,
            },
        }
    }

    /// 1-based line of the range start.
    #[must_use]
    pub const fn start_line(&self) -> u32 {
        self.start.line + 1
    }
}

impl From<LineRange> for Range {
    fn from(range: LineRange) -> Self {
        Self::lines(range.start.saturating_sub(1), range.end.saturating_sub(1))
    }
}
