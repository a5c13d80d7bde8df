//! Draft reviews and whole-list comment updates.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::model::{Comment, CommentId};
use crate::observers::DocumentThreadChangeEvent;
use crate::store::CommentStore;
use crate::threads::{diff_threads, ThreadChangeEvent};

use super::{CommentProvider, CoreError, CoreResult};

impl CommentProvider {
    /// Open a pending review on the active pull request.
    #[tracing::instrument(skip(self))]
    pub async fn start_draft(&mut self) -> CoreResult<()> {
        let pr = self.require_drafts()?;
        self.backend
            .start_review(&pr)
            .await
            .map_err(|e| CoreError::backend(&e))?;

        info!(pr = pr.number, "draft review started");
        self.publish_document(
            &DocumentThreadChangeEvent {
                threads: ThreadChangeEvent::default(),
                in_draft_mode: true,
            },
            true,
        );
        Ok(())
    }

    /// Discard the pending review and every comment it held.
    #[tracing::instrument(skip(self))]
    pub async fn delete_draft(&mut self) -> CoreResult<()> {
        let pr = self.require_drafts()?;
        let deleted = self
            .backend
            .delete_review(&pr)
            .await
            .map_err(|e| CoreError::backend(&e))?;

        let deleted_ids: HashSet<CommentId> = deleted.comments.iter().map(|c| c.id).collect();
        let review_id = deleted.review_id;
        let is_deleted = |c: &Comment| {
            deleted_ids.contains(&c.id) || c.pull_request_review_id == Some(review_id)
        };

        let mut threads = ThreadChangeEvent::default();
        for mut thread in self.workspace_threads(&self.store) {
            let before = thread.comments.len();
            thread
                .comments
                .retain(|tc| self.store.get(tc.comment_id).is_none_or(|c| !is_deleted(c)));
            if thread.comments.is_empty() {
                threads.removed.push(thread);
            } else if thread.comments.len() != before {
                threads.changed.push(thread);
            }
        }

        let removed = self.store.remove_where(is_deleted);
        info!(
            pr = pr.number,
            review_id,
            removed = removed.len(),
            "draft review deleted"
        );

        self.publish_comments();
        self.publish_workspace(&threads);
        self.publish_document(
            &DocumentThreadChangeEvent {
                threads,
                in_draft_mode: false,
            },
            true,
        );
        Ok(())
    }

    /// Submit the pending review.
    ///
    /// Draft flags are cleared by [`Self::review_submitted`], which the
    /// caller invokes once the submitted comments are known.
    #[tracing::instrument(skip(self))]
    pub async fn finish_draft(&mut self) -> CoreResult<()> {
        let pr = self.require_drafts()?;
        self.backend
            .submit_review(&pr)
            .await
            .map_err(|e| CoreError::backend(&e))?;
        info!(pr = pr.number, "draft review submitted");
        Ok(())
    }

    /// Record a submitted review: the submitted comments replace their
    /// drafts and no comment is a draft any more.
    pub fn review_submitted(&mut self, submitted: &[Comment]) {
        for comment in submitted {
            if self.store.contains(comment.id) {
                self.store.insert(Comment {
                    is_draft: false,
                    ..comment.clone()
                });
            }
        }
        self.store.update_all(|c| c.is_draft = false);

        self.publish_comments();
        let threads = ThreadChangeEvent::changed(self.workspace_threads(&self.store));
        self.publish_document(
            &DocumentThreadChangeEvent {
                threads,
                in_draft_mode: false,
            },
            true,
        );
    }

    /// Replace the whole comment list and publish the thread delta.
    ///
    /// Thread events go out only for a non-empty delta; the comments-changed
    /// event only when the list actually differs.
    #[tracing::instrument(skip_all, fields(count = comments.len()))]
    pub async fn update_comments(&mut self, comments: Vec<Comment>) -> ThreadChangeEvent {
        let next = CommentStore::from_comments(comments);
        let old_threads = self.workspace_threads(&self.store);
        let new_threads = self.workspace_threads(&next);
        let delta = diff_threads(&old_threads, new_threads);

        let list_changed = next != self.store;
        self.store = next;

        if delta.is_empty() {
            debug!("comment update produced no thread changes");
        } else {
            let in_draft_mode = self.in_draft_mode().await;
            self.publish_workspace(&delta);
            self.publish_document(
                &DocumentThreadChangeEvent {
                    threads: delta.clone(),
                    in_draft_mode,
                },
                false,
            );
        }

        if list_changed {
            self.publish_comments();
        }
        delta
    }
}
