//! Comment provider facade.
//!
//! Owns the comment store for one pull request and answers document queries
//! by running the diff mappers and thread grouping over it. Mutations go
//! through the review backend first and only touch the store once the
//! backend has accepted them. Changes are published to registered observers.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use reanchor_core::config::ProviderConfig;
//! use reanchor_core::core::{CommentProvider, ReviewSession};
//! use reanchor_core::scm::GitDiffProvider;
//! # async fn demo(backend: Arc<dyn reanchor_core::backend::ReviewBackend>) {
//! let config = ProviderConfig::new("/repo");
//! let diffs = Arc::new(GitDiffProvider::new("/repo".into()));
//! let mut provider = CommentProvider::new(config, diffs, backend, ReviewSession::default());
//! let id = provider.on_workspace_threads_changed(|event| println!("{event:?}"));
//! provider.unsubscribe(id);
//! # }
//! ```

pub mod comments;
pub mod documents;
pub mod errors;
pub mod reviews;

pub use errors::{format_error, CoreError, CoreResult};

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::anchor::map_comments_to_head;
use crate::backend::ReviewBackend;
use crate::config::{DraftLabels, ProviderConfig};
use crate::diff::LineMap;
use crate::document::DocumentUri;
use crate::model::{Comment, FileChange, LocalFileChange, PullRequestRef, Range};
use crate::observers::{
    CommentsChangedEvent, DocumentThreadChangeEvent, Observers, SubscriptionId, SubscriptionIds,
};
use crate::scm::DiffProvider;
use crate::store::CommentStore;
use crate::threads::{
    comments_to_threads, CollapsibleState, CommentThread, Resource, ThreadChangeEvent,
};

/// State the provider starts from.
#[derive(Debug, Clone, Default)]
pub struct ReviewSession {
    pub pull_request: Option<PullRequestRef>,
    /// Files changed by the pull request.
    pub local_changes: Vec<FileChange>,
    /// Files as changed by earlier commits, for outdated comments.
    pub obsolete_changes: Vec<FileChange>,
    pub comments: Vec<Comment>,
}

/// Answer to a document query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentInfo {
    pub threads: Vec<CommentThread>,
    /// Ranges where new threads may be started.
    pub commenting_ranges: Vec<Range>,
    pub in_draft_mode: bool,
}

pub struct CommentProvider {
    config: ProviderConfig,
    diffs: Arc<dyn DiffProvider>,
    backend: Arc<dyn ReviewBackend>,
    pull_request: Option<PullRequestRef>,
    local_changes: Vec<FileChange>,
    obsolete_changes: Vec<FileChange>,
    store: CommentStore,
    subscriptions: SubscriptionIds,
    document_observers: Observers<DocumentThreadChangeEvent>,
    workspace_observers: Observers<ThreadChangeEvent>,
    comment_observers: Observers<CommentsChangedEvent>,
}

impl std::fmt::Debug for CommentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentProvider")
            .field("config", &self.config)
            .field("pull_request", &self.pull_request)
            .field("local_changes", &self.local_changes.len())
            .field("comments", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl CommentProvider {
    #[must_use]
    pub fn new(
        config: ProviderConfig,
        diffs: Arc<dyn DiffProvider>,
        backend: Arc<dyn ReviewBackend>,
        session: ReviewSession,
    ) -> Self {
        Self {
            config,
            diffs,
            backend,
            pull_request: session.pull_request,
            local_changes: session.local_changes,
            obsolete_changes: session.obsolete_changes,
            store: CommentStore::from_comments(session.comments),
            subscriptions: SubscriptionIds::default(),
            document_observers: Observers::default(),
            workspace_observers: Observers::default(),
            comment_observers: Observers::default(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    #[must_use]
    pub const fn pull_request(&self) -> Option<&PullRequestRef> {
        self.pull_request.as_ref()
    }

    #[must_use]
    pub const fn store(&self) -> &CommentStore {
        &self.store
    }

    /// Snapshot of every comment, in id order.
    #[must_use]
    pub fn comments(&self) -> Vec<Comment> {
        self.store.to_vec()
    }

    /// Replace the changed-file lists, e.g. after the pull request moved.
    pub fn set_file_changes(&mut self, local: Vec<FileChange>, obsolete: Vec<FileChange>) {
        self.local_changes = local;
        self.obsolete_changes = obsolete;
    }

    /// Labels for the draft review actions, when the pull request supports drafts.
    #[must_use]
    pub fn draft_labels(&self) -> Option<&DraftLabels> {
        self.pull_request
            .as_ref()
            .filter(|pr| pr.supports_drafts)
            .map(|_| &self.config.draft_labels)
    }

    pub fn on_document_threads_changed(
        &mut self,
        callback: impl Fn(&DocumentThreadChangeEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.subscriptions.next_id();
        self.document_observers.subscribe(id, callback);
        id
    }

    pub fn on_workspace_threads_changed(
        &mut self,
        callback: impl Fn(&ThreadChangeEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.subscriptions.next_id();
        self.workspace_observers.subscribe(id, callback);
        id
    }

    pub fn on_comments_changed(
        &mut self,
        callback: impl Fn(&CommentsChangedEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.subscriptions.next_id();
        self.comment_observers.subscribe(id, callback);
        id
    }

    /// Remove an observer from whichever stream it was registered on.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.document_observers.unsubscribe(id)
            || self.workspace_observers.unsubscribe(id)
            || self.comment_observers.unsubscribe(id)
    }

    /// Drop every observer.
    pub fn dispose(&mut self) {
        self.document_observers.clear();
        self.workspace_observers.clear();
        self.comment_observers.clear();
    }

    /// Whether the active pull request has a pending review. Failures read as `false`.
    pub async fn in_draft_mode(&self) -> bool {
        let Some(pr) = self.pull_request.as_ref().filter(|pr| pr.supports_drafts) else {
            return false;
        };
        match self.backend.is_in_draft_mode(pr).await {
            Ok(in_draft) => in_draft,
            Err(err) => {
                warn!(pr = pr.number, error = %format_error(&err), "draft mode query failed");
                false
            }
        }
    }

    fn require_pull_request(&self) -> CoreResult<PullRequestRef> {
        self.pull_request
            .clone()
            .ok_or(CoreError::NoActivePullRequest)
    }

    fn require_drafts(&self) -> CoreResult<PullRequestRef> {
        let pr = self.require_pull_request()?;
        if pr.supports_drafts {
            Ok(pr)
        } else {
            Err(CoreError::DraftsUnsupported { number: pr.number })
        }
    }

    fn repository_root(&self) -> &Path {
        &self.config.repository_root
    }

    fn local_change(&self, path: &str) -> Option<&LocalFileChange> {
        find_change(&self.local_changes, path, None)
    }

    /// The changed file a document shows, if any.
    fn matched_file(&self, uri: &DocumentUri) -> Option<&LocalFileChange> {
        match uri {
            DocumentUri::Review(query) if query.is_outdated => {
                find_change(&self.obsolete_changes, &query.path, Some(&query.commit))
            }
            DocumentUri::Review(query) => {
                find_change(&self.local_changes, &query.path, Some(&query.commit))
            }
            DocumentUri::PullRequest { path, .. } => self.local_change(path),
            DocumentUri::File { path } => {
                let relative = self.config.relative_path(path)?;
                self.local_change(&relative)
            }
        }
    }

    fn matched_file_or_err(&self, uri: &DocumentUri) -> CoreResult<LocalFileChange> {
        self.matched_file(uri)
            .cloned()
            .ok_or_else(|| CoreError::FileNotFound {
                uri: uri.to_string(),
            })
    }

    /// Threads of one changed file as shown on the live file, built from the
    /// comments in `store` that pass `filter`.
    ///
    /// Comments are placed at the head commit the way the live file view
    /// places them; those without a line there are left out.
    fn file_threads(
        &self,
        store: &CommentStore,
        change: &LocalFileChange,
        filter: impl Fn(&Comment) -> bool,
    ) -> Vec<CommentThread> {
        let located = map_comments_to_head(
            &change.hunks,
            &LineMap::default(),
            store.for_path(&change.path).filter(|c| filter(c)),
        );
        let root = self.repository_root();
        comments_to_threads(
            &located,
            |path| Resource::file(root, path),
            CollapsibleState::Expanded,
        )
    }

    /// Threads of every changed file, built from `store`.
    fn workspace_threads(&self, store: &CommentStore) -> Vec<CommentThread> {
        self.local_changes
            .iter()
            .filter_map(FileChange::as_local)
            .flat_map(|change| self.file_threads(store, change, |_| true))
            .collect()
    }

    fn publish_comments(&self) {
        self.comment_observers.emit(&CommentsChangedEvent {
            comments: self.store.to_vec(),
        });
    }

    fn publish_workspace(&self, event: &ThreadChangeEvent) {
        if event.is_empty() {
            debug!("workspace thread event suppressed: no changes");
            return;
        }
        self.workspace_observers.emit(event);
    }

    /// Publish a document event. Events without thread changes go out only
    /// when they announce a draft mode transition.
    fn publish_document(&self, event: &DocumentThreadChangeEvent, draft_transition: bool) {
        if event.threads.is_empty() && !draft_transition {
            debug!("document thread event suppressed: no changes");
            return;
        }
        self.document_observers.emit(event);
    }
}

/// Find a local change by path, optionally also matching its head or base commit.
fn find_change<'a>(
    changes: &'a [FileChange],
    path: &str,
    commit: Option<&str>,
) -> Option<&'a LocalFileChange> {
    changes
        .iter()
        .filter_map(FileChange::as_local)
        .find(|c| c.path == path && commit.is_none_or(|commit| c.has_commit(commit)))
}
