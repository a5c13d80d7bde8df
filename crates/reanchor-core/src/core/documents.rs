//! Read path: threads and commenting ranges for a document.

use tracing::{debug, warn};

use crate::anchor::{anchor_comments_in_diff, map_comments_to_head, outdated_anchor_line};
use crate::diff::{commenting_ranges, DiffSide, LineMap};
use crate::document::{Document, DocumentUri, ReviewQuery};
use crate::model::{Comment, LocalFileChange, PullRequestRef, Range};
use crate::scm::Revision;
use crate::threads::{
    build_thread, comments_to_threads, group_comments, CollapsibleState, CommentThread, Resource,
};

use super::{find_change, format_error, CommentInfo, CommentProvider};

impl CommentProvider {
    /// Threads, commenting ranges and draft state for a document.
    ///
    /// Returns `None` when the document shows nothing this provider has
    /// comments for, or when the data needed to place them is unavailable.
    #[tracing::instrument(skip_all, fields(uri = %document.uri))]
    pub async fn provide_document_comments(&self, document: &Document) -> Option<CommentInfo> {
        match &document.uri {
            DocumentUri::PullRequest { path, base } => {
                self.pull_request_view(path, DiffSide::from_base(*base)).await
            }
            DocumentUri::Review(query) => self.review_view(query).await,
            DocumentUri::File { .. } => self.live_file_view(document).await,
        }
    }

    async fn pull_request_view(&self, path: &str, side: DiffSide) -> Option<CommentInfo> {
        let change = self.local_change(path)?;
        let commit = match side {
            DiffSide::Base => &change.base_commit,
            DiffSide::Head => &change.head_commit,
        };
        Some(self.diff_view(change, commit, side).await)
    }

    async fn review_view(&self, query: &ReviewQuery) -> Option<CommentInfo> {
        let side = DiffSide::from_base(query.base);
        if let Some(change) = find_change(&self.local_changes, &query.path, Some(&query.commit)) {
            return Some(self.diff_view(change, &query.commit, side).await);
        }

        // Not a current change: show outdated comments written against this commit
        let outdated: Vec<&Comment> =
            match find_change(&self.obsolete_changes, &query.path, Some(&query.commit)) {
                Some(change) => self.store.outdated_for(change).collect(),
                None => self
                    .store
                    .for_path(&query.path)
                    .filter(|c| {
                        c.original_commit_id == query.commit
                            || format!("{}^", c.original_commit_id) == query.commit
                    })
                    .collect(),
            };
        if outdated.is_empty() {
            return None;
        }

        let resource = Resource::Diff {
            path: query.path.clone(),
            commit: query.commit.clone(),
            base: query.base,
        };
        let threads = outdated_threads(&outdated, side, &resource);
        Some(CommentInfo {
            threads,
            commenting_ranges: Vec::new(),
            in_draft_mode: self.in_draft_mode().await,
        })
    }

    /// Expanded threads of the active comments on one side of a current change.
    async fn diff_view(
        &self,
        change: &LocalFileChange,
        commit: &str,
        side: DiffSide,
    ) -> CommentInfo {
        let anchored = anchor_comments_in_diff(
            self.store.active_for_path(&change.path),
            &change.hunks,
            side,
        );
        let threads = comments_to_threads(
            &anchored,
            |path| Resource::Diff {
                path: path.to_string(),
                commit: commit.to_string(),
                base: side == DiffSide::Base,
            },
            CollapsibleState::Expanded,
        );
        CommentInfo {
            threads,
            commenting_ranges: commenting_ranges(&change.hunks, side)
                .into_iter()
                .map(Range::from)
                .collect(),
            in_draft_mode: self.in_draft_mode().await,
        }
    }

    async fn live_file_view(&self, document: &Document) -> Option<CommentInfo> {
        let DocumentUri::File { path } = &document.uri else {
            return None;
        };
        let Some(relative) = self.config.relative_path(path) else {
            debug!(path = %path.display(), "document outside repository root");
            return None;
        };
        let change = self.local_change(&relative)?;
        let pr = self.pull_request.as_ref()?;

        let content_diff = match self.content_diff(document, pr, &relative).await {
            Ok(diff) => diff,
            Err(err) => {
                warn!(path = %relative, error = %format_error(&err), "content diff unavailable");
                return None;
            }
        };
        let map = match LineMap::parse(&content_diff) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %relative, error = %err, "content diff unparseable");
                return None;
            }
        };

        let placed = map_comments_to_head(&change.hunks, &map, self.store.for_path(&relative));
        let root = self.repository_root();
        let threads = comments_to_threads(
            &placed,
            |p| Resource::file(root, p),
            CollapsibleState::Collapsed,
        );

        Some(CommentInfo {
            threads,
            commenting_ranges: live_commenting_ranges(change, &map),
            in_draft_mode: self.in_draft_mode().await,
        })
    }

    /// Diff from the pull request head to what the document currently holds.
    ///
    /// A dirty buffer is hashed and diffed blob to blob; a clean one is the
    /// file on disk.
    pub(crate) async fn content_diff(
        &self,
        document: &Document,
        pr: &PullRequestRef,
        path: &str,
    ) -> anyhow::Result<String> {
        if document.is_dirty {
            let committed = self.diffs.blob_id_at(&pr.head_sha, path).await?;
            let buffer = self.diffs.hash_content(&document.text).await?;
            self.diffs.diff_blobs(&committed, &buffer).await
        } else {
            self.diffs
                .diff_between(&pr.head_sha, &Revision::WorkingTree, path)
                .await
        }
    }
}

/// Head-side hunk ranges moved into working-copy lines. A range is offered
/// only when both of its ends still exist.
fn live_commenting_ranges(change: &LocalFileChange, content_diff: &LineMap) -> Vec<Range> {
    commenting_ranges(&change.hunks, DiffSide::Head)
        .into_iter()
        .filter_map(|range| {
            let start = content_diff.map_old_to_new(range.start)?;
            let end = content_diff.map_old_to_new(range.end)?;
            Some(Range::lines(start - 1, end - 1))
        })
        .collect()
}

/// One thread per anchor of outdated comments, placed via their captured hunk.
fn outdated_threads(
    comments: &[&Comment],
    side: DiffSide,
    resource: &Resource,
) -> Vec<CommentThread> {
    group_comments(comments.iter().copied())
        .iter()
        .filter_map(|group| {
            let first = group.comments.first()?;
            let line = match outdated_anchor_line(first, side) {
                Ok(line) => line?,
                Err(err) => {
                    warn!(comment_id = first.id, error = %err, "captured hunk unparseable");
                    return None;
                }
            };
            let mut thread = build_thread(group, resource.clone(), CollapsibleState::Expanded)?;
            thread.range = Range::at_line(line);
            Some(thread)
        })
        .collect()
}
