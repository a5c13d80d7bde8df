//! Comment store: the single owner of every comment record.
//!
//! Comments are kept by id, which orders them chronologically. Per-file views
//! are answered from a path index holding ids only.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Comment, CommentId, LocalFileChange};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentStore {
    comments: BTreeMap<CommentId, Comment>,
    by_path: BTreeMap<String, BTreeSet<CommentId>>,
}

impl CommentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list. A later duplicate id replaces an earlier one.
    #[must_use]
    pub fn from_comments(comments: impl IntoIterator<Item = Comment>) -> Self {
        let mut store = Self::new();
        for comment in comments {
            store.insert(comment);
        }
        store
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: CommentId) -> bool {
        self.comments.contains_key(&id)
    }

    /// Insert or replace a comment, returning the previous record.
    pub fn insert(&mut self, comment: Comment) -> Option<Comment> {
        let previous = self.comments.insert(comment.id, comment.clone());
        if let Some(old) = &previous {
            if old.path != comment.path {
                self.unindex(old.id, &old.path);
            }
        }
        self.by_path
            .entry(comment.path)
            .or_default()
            .insert(comment.id);
        previous
    }

    pub fn remove(&mut self, id: CommentId) -> Option<Comment> {
        let removed = self.comments.remove(&id)?;
        self.unindex(id, &removed.path);
        Some(removed)
    }

    /// Remove every comment matching `predicate`, returning them in id order.
    pub fn remove_where(&mut self, predicate: impl Fn(&Comment) -> bool) -> Vec<Comment> {
        let ids: Vec<CommentId> = self
            .comments
            .values()
            .filter(|c| predicate(c))
            .map(|c| c.id)
            .collect();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Apply `update` to every comment. Ids and paths must not change.
    pub fn update_all(&mut self, mut update: impl FnMut(&mut Comment)) {
        for comment in self.comments.values_mut() {
            update(comment);
        }
    }

    fn unindex(&mut self, id: CommentId, path: &str) {
        if let Some(ids) = self.by_path.get_mut(path) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_path.remove(path);
            }
        }
    }

    /// All comments in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.values()
    }

    /// All comments on `path` in id order.
    pub fn for_path<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a Comment> + 'a {
        self.by_path
            .get(path)
            .into_iter()
            .flatten()
            .filter_map(|id| self.comments.get(id))
    }

    /// Comments on `path` that still have a position in the current diff.
    pub fn active_for_path<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a Comment> + 'a {
        self.for_path(path).filter(|c| !c.is_outdated())
    }

    /// Outdated comments that were written against `change`'s head commit.
    pub fn outdated_for<'a>(
        &'a self,
        change: &'a LocalFileChange,
    ) -> impl Iterator<Item = &'a Comment> + 'a {
        self.for_path(&change.path)
            .filter(|c| c.is_outdated() && c.original_commit_id == change.head_commit)
    }

    /// Paths that have at least one comment.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Comment> {
        self.comments.values().cloned().collect()
    }
}
