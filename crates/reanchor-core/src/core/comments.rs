//! Comment mutations: reply, create, edit, delete.

use std::path::Path;

use tracing::debug;

use crate::diff::{absolute_to_position, LineMap};
use crate::document::{Document, DocumentUri};
use crate::model::{Comment, CommentId, LocalFileChange, Range};
use crate::observers::DocumentThreadChangeEvent;
use crate::threads::{
    CollapsibleState, CommentThread, Resource, ThreadChangeEvent, ThreadComment, ThreadId,
    ThreadKey,
};

use super::{CommentProvider, CoreError, CoreResult};

impl CommentProvider {
    /// Reply to an existing thread.
    ///
    /// Returns the thread with the reply appended.
    #[tracing::instrument(skip(self, document, thread, text), fields(uri = %document.uri, thread_id = %thread.thread_id))]
    pub async fn reply_to_thread(
        &mut self,
        document: &Document,
        thread: &CommentThread,
        text: &str,
    ) -> CoreResult<CommentThread> {
        let pr = self.require_pull_request()?;
        self.matched_file_or_err(&document.uri)?;
        let parent = self
            .store
            .get(thread.thread_id.comment_id())
            .cloned()
            .ok_or_else(|| CoreError::ThreadNotFound {
                thread_id: thread.thread_id.to_string(),
            })?;

        let reply = self
            .backend
            .create_reply(&pr, text, &parent)
            .await
            .map_err(|e| CoreError::backend(&e))?;

        let mut updated = thread.clone();
        updated.comments.push(ThreadComment::from(&reply));
        self.store.insert(reply);

        self.publish_comments();
        let on_file = updated.clone().on_file(self.repository_root());
        self.publish_workspace(&ThreadChangeEvent::changed(vec![on_file]));
        Ok(updated)
    }

    /// Start a new thread at `range.start` of the document.
    ///
    /// For live files the line is first moved from the working copy back to
    /// the pull request head; diff views are already in diff coordinates.
    #[tracing::instrument(skip(self, document, text), fields(uri = %document.uri, line = range.start_line()))]
    pub async fn create_thread(
        &mut self,
        document: &Document,
        range: Range,
        text: &str,
    ) -> CoreResult<CommentThread> {
        let change = self.matched_file_or_err(&document.uri)?;
        let pr = self.require_pull_request()?;
        let side = document.uri.side();
        let line = range.start_line();

        let content_diff = if matches!(document.uri, DocumentUri::File { .. }) {
            let diff = self
                .content_diff(document, &pr, &change.path)
                .await
                .map_err(|e| CoreError::diff_provider(&e))?;
            Some(LineMap::parse(&diff)?)
        } else {
            None
        };

        let position = absolute_to_position(&change.hunks, line, side, content_diff.as_ref())
            .ok_or_else(|| CoreError::PositionUnrepresentable {
                path: change.path.clone(),
                line,
            })?;

        let comment = self
            .backend
            .create_comment(&pr, text, &change.path, position)
            .await
            .map_err(|e| CoreError::backend(&e))?;

        let thread = CommentThread {
            thread_id: ThreadId(comment.id),
            key: ThreadKey::of(&comment),
            resource: document_resource(&document.uri, &change, self.repository_root()),
            range: Range::point(range.start.line),
            comments: vec![ThreadComment::from(&comment)],
            collapsible_state: CollapsibleState::Expanded,
        };
        self.store.insert(comment);

        self.publish_comments();
        let on_file = thread.clone().on_file(self.repository_root());
        self.publish_workspace(&ThreadChangeEvent::added(vec![on_file]));
        Ok(thread)
    }

    /// Replace the body of a comment.
    #[tracing::instrument(skip(self, document, text), fields(uri = %document.uri))]
    pub async fn edit_comment(
        &mut self,
        document: &Document,
        comment_id: CommentId,
        text: &str,
    ) -> CoreResult<Comment> {
        let pr = self.require_pull_request()?;
        let change = self.matched_file_or_err(&document.uri)?;
        let existing = self
            .store
            .get(comment_id)
            .filter(|c| c.path == change.path)
            .cloned()
            .ok_or(CoreError::CommentNotFound { comment_id })?;

        let edited = self
            .backend
            .edit_comment(&pr, &existing, text)
            .await
            .map_err(|e| CoreError::backend(&e))?;
        self.store.insert(edited.clone());

        let key = ThreadKey::of(&edited);
        let changed = self.file_threads(&self.store, &change, |c| ThreadKey::of(c) == key);
        self.publish_workspace(&ThreadChangeEvent::changed(changed));
        self.publish_comments();
        Ok(edited)
    }

    /// Delete a comment.
    ///
    /// When other comments remain in its thread the regrouped thread is
    /// reported as changed; its id may differ from the one the caller saw.
    #[tracing::instrument(skip(self, document), fields(uri = %document.uri))]
    pub async fn delete_comment(
        &mut self,
        document: &Document,
        comment_id: CommentId,
    ) -> CoreResult<()> {
        let pr = self.require_pull_request()?;
        let change = self.matched_file_or_err(&document.uri)?;

        self.backend
            .delete_comment(&pr, comment_id)
            .await
            .map_err(|e| CoreError::backend(&e))?;

        let Some(deleted) = self.store.remove(comment_id) else {
            debug!(comment_id, "deleted comment was not in the store");
            return Ok(());
        };

        if deleted.path == change.path {
            let key = ThreadKey::of(&deleted);
            let remaining = self.file_threads(&self.store, &change, |c| ThreadKey::of(c) == key);
            let threads = if remaining.is_empty() {
                ThreadChangeEvent::removed(vec![CommentThread::removed(
                    &deleted,
                    Resource::file(self.repository_root(), &deleted.path),
                )])
            } else {
                ThreadChangeEvent::changed(remaining)
            };

            self.publish_workspace(&threads);
            let in_draft_mode = self.in_draft_mode().await;
            self.publish_document(
                &DocumentThreadChangeEvent {
                    threads,
                    in_draft_mode,
                },
                false,
            );
        }

        self.publish_comments();
        Ok(())
    }
}

/// Resource a thread created on `uri` belongs to.
fn document_resource(uri: &DocumentUri, change: &LocalFileChange, root: &Path) -> Resource {
    match uri {
        DocumentUri::PullRequest { path, base } => Resource::Diff {
            path: path.clone(),
            commit: if *base {
                change.base_commit.clone()
            } else {
                change.head_commit.clone()
            },
            base: *base,
        },
        DocumentUri::Review(query) => Resource::Diff {
            path: query.path.clone(),
            commit: query.commit.clone(),
            base: query.base,
        },
        DocumentUri::File { .. } => Resource::file(root, &change.path),
    }
}
