//! Review backend: remote persistence of comments and reviews.

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Comment, CommentId, PullRequestRef};

/// What a deleted draft review took with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedReview {
    pub review_id: u64,
    pub comments: Vec<Comment>,
}

/// Remote comment storage for a pull request.
///
/// Every call either returns the persisted record or fails; the provider
/// wraps failures and never retries them.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Create a comment on `path` at diff `position`.
    async fn create_comment(
        &self,
        pr: &PullRequestRef,
        body: &str,
        path: &str,
        position: u32,
    ) -> Result<Comment>;

    async fn create_reply(&self, pr: &PullRequestRef, body: &str, parent: &Comment)
        -> Result<Comment>;

    async fn edit_comment(&self, pr: &PullRequestRef, comment: &Comment, body: &str)
        -> Result<Comment>;

    async fn delete_comment(&self, pr: &PullRequestRef, id: CommentId) -> Result<()>;

    /// Open a pending review; comments created afterwards are drafts.
    async fn start_review(&self, pr: &PullRequestRef) -> Result<()>;

    /// Publish the pending review.
    async fn submit_review(&self, pr: &PullRequestRef) -> Result<()>;

    /// Discard the pending review and its comments.
    async fn delete_review(&self, pr: &PullRequestRef) -> Result<DeletedReview>;

    async fn is_in_draft_mode(&self, pr: &PullRequestRef) -> Result<bool>;
}
