//! Thread grouping and reconciliation.
//!
//! Comments sharing a file and an anchor position form one thread. A thread
//! is identified by the id of its first comment, so deleting that comment
//! gives the regrouped thread a new id; [`ThreadKey`] stays the same and lets
//! a renderer correlate the two.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::model::{Comment, CommentId, Range};

/// Thread identifier: the id of the thread's first comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ThreadId(pub CommentId);

impl ThreadId {
    #[must_use]
    pub const fn comment_id(self) -> CommentId {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grouping key: file plus diff position (or original position when outdated).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ThreadKey {
    pub path: String,
    pub position: u32,
}

impl ThreadKey {
    #[must_use]
    pub fn of(comment: &Comment) -> Self {
        Self {
            path: comment.path.clone(),
            position: comment.anchor_position(),
        }
    }
}

/// Where a thread is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    /// A live working-copy file.
    File { path: PathBuf },
    /// One side of a diff view at a commit.
    Diff {
        path: String,
        commit: String,
        base: bool,
    },
}

impl Resource {
    /// File resource for a repository-relative path.
    #[must_use]
    pub fn file(root: &Path, path: &str) -> Self {
        Self::File {
            path: root.join(path),
        }
    }

    #[must_use]
    pub const fn is_live_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollapsibleState {
    Expanded,
    Collapsed,
}

/// A comment as shown inside a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadComment {
    pub comment_id: CommentId,
    pub body: String,
    pub author: String,
    pub is_draft: bool,
}

impl From<&Comment> for ThreadComment {
    fn from(comment: &Comment) -> Self {
        Self {
            comment_id: comment.id,
            body: comment.body.clone(),
            author: comment.author.clone(),
            is_draft: comment.is_draft,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentThread {
    pub thread_id: ThreadId,
    pub key: ThreadKey,
    pub resource: Resource,
    pub range: Range,
    pub comments: Vec<ThreadComment>,
    pub collapsible_state: CollapsibleState,
}

impl CommentThread {
    /// Placeholder for a thread that no longer has comments.
    #[must_use]
    pub fn removed(comment: &Comment, resource: Resource) -> Self {
        Self {
            thread_id: ThreadId(comment.id),
            key: ThreadKey::of(comment),
            resource,
            range: Range::default(),
            comments: Vec::new(),
            collapsible_state: CollapsibleState::Expanded,
        }
    }

    /// Same thread, rendered on the live file under `root`.
    #[must_use]
    pub fn on_file(mut self, root: &Path) -> Self {
        self.resource = Resource::file(root, &self.key.path);
        self
    }
}

/// Comments sharing one [`ThreadKey`], in list order.
#[derive(Debug)]
pub struct CommentGroup<'a> {
    pub key: ThreadKey,
    pub comments: Vec<&'a Comment>,
}

/// Group comments by (path, position), keeping first-appearance order of
/// groups and list order within each group.
pub fn group_comments<'a>(
    comments: impl IntoIterator<Item = &'a Comment>,
) -> Vec<CommentGroup<'a>> {
    let mut groups: Vec<CommentGroup<'a>> = Vec::new();
    let mut index: HashMap<ThreadKey, usize> = HashMap::new();

    for comment in comments {
        let key = ThreadKey::of(comment);
        if let Some(&i) = index.get(&key) {
            groups[i].comments.push(comment);
        } else {
            index.insert(key.clone(), groups.len());
            groups.push(CommentGroup {
                key,
                comments: vec![comment],
            });
        }
    }

    groups
}

/// Build the thread for one group. The range sits at the first comment's
/// absolute position (line 1 when it has none).
#[must_use]
pub fn build_thread(
    group: &CommentGroup<'_>,
    resource: Resource,
    collapsible_state: CollapsibleState,
) -> Option<CommentThread> {
    let first = group.comments.first()?;
    Some(CommentThread {
        thread_id: ThreadId(first.id),
        key: group.key.clone(),
        resource,
        range: Range::at_line(first.absolute_position.unwrap_or(1)),
        comments: group.comments.iter().map(|c| ThreadComment::from(*c)).collect(),
        collapsible_state,
    })
}

/// Group comments and build one thread per group.
pub fn comments_to_threads<'a, F>(
    comments: impl IntoIterator<Item = &'a Comment>,
    resource_for: F,
    collapsible_state: CollapsibleState,
) -> Vec<CommentThread>
where
    F: Fn(&str) -> Resource,
{
    group_comments(comments)
        .iter()
        .filter_map(|g| build_thread(g, resource_for(&g.key.path), collapsible_state))
        .collect()
}

/// Added, changed and removed threads between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThreadChangeEvent {
    pub added: Vec<CommentThread>,
    pub changed: Vec<CommentThread>,
    pub removed: Vec<CommentThread>,
}

impl ThreadChangeEvent {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    #[must_use]
    pub fn added(threads: Vec<CommentThread>) -> Self {
        Self {
            added: threads,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn changed(threads: Vec<CommentThread>) -> Self {
        Self {
            changed: threads,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn removed(threads: Vec<CommentThread>) -> Self {
        Self {
            removed: threads,
            ..Self::default()
        }
    }
}

/// Whether the comments of a thread differ between two versions: a different
/// count, or an old comment without exactly one new comment of the same id
/// and body.
#[must_use]
pub fn comments_edited(old: &[ThreadComment], new: &[ThreadComment]) -> bool {
    if old.len() != new.len() {
        return true;
    }
    old.iter().any(|o| {
        let mut matches = new.iter().filter(|n| n.comment_id == o.comment_id);
        match (matches.next(), matches.next()) {
            (Some(n), None) => n.body != o.body,
            _ => true,
        }
    })
}

/// Delta between two thread snapshots, matched by thread id.
///
/// Newly added threads on live files start collapsed.
#[must_use]
pub fn diff_threads(old: &[CommentThread], new: Vec<CommentThread>) -> ThreadChangeEvent {
    let old_by_id: HashMap<ThreadId, &CommentThread> =
        old.iter().map(|t| (t.thread_id, t)).collect();
    let new_ids: HashSet<ThreadId> = new.iter().map(|t| t.thread_id).collect();

    let mut event = ThreadChangeEvent {
        removed: old
            .iter()
            .filter(|t| !new_ids.contains(&t.thread_id))
            .cloned()
            .collect(),
        ..ThreadChangeEvent::default()
    };

    for mut thread in new {
        match old_by_id.get(&thread.thread_id) {
            None => {
                if thread.resource.is_live_file() {
                    thread.collapsible_state = CollapsibleState::Collapsed;
                }
                event.added.push(thread);
            }
            Some(previous) if comments_edited(&previous.comments, &thread.comments) => {
                event.changed.push(thread);
            }
            Some(_) => {}
        }
    }

    event
}

/// Group both comment lists and compute the thread delta between them.
pub fn reconcile<F>(
    old_comments: &[Comment],
    new_comments: &[Comment],
    resource_for: F,
    collapsible_state: CollapsibleState,
) -> ThreadChangeEvent
where
    F: Fn(&str) -> Resource,
{
    let old = comments_to_threads(old_comments, &resource_for, collapsible_state);
    let new = comments_to_threads(new_comments, &resource_for, collapsible_state);
    diff_threads(&old, new)
}
