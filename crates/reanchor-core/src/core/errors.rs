//! Typed error types for the comment provider.

use thiserror::Error;

use crate::diff::DiffError;
use crate::model::CommentId;

/// Result type alias for provider operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the comment provider.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No changed file matches the document.
    #[error("Unable to find matching file for {uri}")]
    FileNotFound { uri: String },

    /// The thread's first comment is not in the store.
    #[error("Unable to find thread to respond to: {thread_id}")]
    ThreadNotFound { thread_id: String },

    #[error("Unable to find comment {comment_id}")]
    CommentNotFound { comment_id: CommentId },

    #[error("No active pull request")]
    NoActivePullRequest,

    /// The backend cannot hold pending reviews for this pull request.
    #[error("Pull request #{number} does not support draft reviews")]
    DraftsUnsupported { number: u64 },

    /// The line is not part of the diff, so no comment can be placed there.
    #[error("Cannot comment on line {line} of {path}: computed position is negative")]
    PositionUnrepresentable { path: String, line: u32 },

    /// The review backend failed.
    #[error("Review backend error: {0}")]
    Backend(String),

    /// The diff provider failed.
    #[error("Diff provider error: {0}")]
    DiffProvider(String),

    /// A diff could not be parsed.
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// Wrap a review backend failure, keeping its whole cause chain in one message.
    #[must_use]
    pub fn backend(err: &anyhow::Error) -> Self {
        Self::Backend(format_error(err))
    }

    /// Wrap a diff provider failure, keeping its whole cause chain in one message.
    #[must_use]
    pub fn diff_provider(err: &anyhow::Error) -> Self {
        Self::DiffProvider(format_error(err))
    }
}

/// Format an error and its causes as `outer: inner: root`.
#[must_use]
pub fn format_error(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
