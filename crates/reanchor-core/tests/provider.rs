//! Comment provider tests against in-memory collaborators.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use pretty_assertions::assert_eq;

use reanchor_core::backend::{DeletedReview, ReviewBackend};
use reanchor_core::config::ProviderConfig;
use reanchor_core::core::{CommentProvider, CoreError, ReviewSession};
use reanchor_core::document::{Document, DocumentUri, ReviewQuery};
use reanchor_core::model::{
    Comment, CommentId, FileChange, LocalFileChange, PullRequestRef, Range,
};
use reanchor_core::observers::{CommentsChangedEvent, DocumentThreadChangeEvent};
use reanchor_core::scm::{DiffProvider, Revision};
use reanchor_core::threads::{CollapsibleState, CommentThread, Resource, ThreadChangeEvent};

const PATH: &str = "src/a.ts";

// header 0, one 1, +two 2, three 3, four 4, header 5, ten 6, +eleven 7, twelve 8
const PR_PATCH: &str = "@@ -1,3 +1,4 @@\n one\n+two\n three\n four\n@@ -10,2 +11,3 @@\n ten\n+eleven\n twelve\n";

// Two lines inserted at the top of the working copy
const WORKING_DIFF: &str = "@@ -0,0 +1,2 @@\n+x\n+y\n";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeDiffs {
    working_diff: String,
    blob_diff: String,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeDiffs {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DiffProvider for FakeDiffs {
    async fn diff_between(&self, from: &str, to: &Revision, path: &str) -> Result<String> {
        self.record(format!("diff_between {from} {to} {path}"));
        if self.fail {
            bail!("git exploded");
        }
        Ok(self.working_diff.clone())
    }

    async fn diff_blobs(&self, old_blob: &str, new_blob: &str) -> Result<String> {
        self.record(format!("diff_blobs {old_blob} {new_blob}"));
        Ok(self.blob_diff.clone())
    }

    async fn hash_content(&self, _text: &str) -> Result<String> {
        self.record("hash_content".to_string());
        Ok("buffer-blob".to_string())
    }

    async fn blob_id_at(&self, commit: &str, path: &str) -> Result<String> {
        self.record(format!("blob_id_at {commit} {path}"));
        Ok("head-blob".to_string())
    }
}

#[derive(Default)]
struct BackendState {
    next_id: CommentId,
    in_draft: bool,
    fail: bool,
    fail_draft_query: bool,
    created: Vec<(String, u32)>,
    review_comments: Vec<Comment>,
}

#[derive(Default)]
struct FakeBackend {
    state: Mutex<BackendState>,
}

impl FakeBackend {
    fn next_comment(&self, path: &str, position: u32, body: &str) -> Result<Comment> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            bail!("HTTP 502");
        }
        state.next_id += 1;
        let mut comment = comment(100 + state.next_id, position, body);
        comment.path = path.to_string();
        comment.is_draft = state.in_draft;
        Ok(comment)
    }

    fn check(&self) -> Result<()> {
        if self.state.lock().unwrap().fail {
            bail!("HTTP 502");
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewBackend for FakeBackend {
    async fn create_comment(
        &self,
        _pr: &PullRequestRef,
        body: &str,
        path: &str,
        position: u32,
    ) -> Result<Comment> {
        let created = self.next_comment(path, position, body)?;
        self.state
            .lock()
            .unwrap()
            .created
            .push((path.to_string(), position));
        Ok(created)
    }

    async fn create_reply(
        &self,
        _pr: &PullRequestRef,
        body: &str,
        parent: &Comment,
    ) -> Result<Comment> {
        let mut reply = self.next_comment(&parent.path, parent.original_position, body)?;
        reply.position = parent.position;
        Ok(reply)
    }

    async fn edit_comment(
        &self,
        _pr: &PullRequestRef,
        comment: &Comment,
        body: &str,
    ) -> Result<Comment> {
        self.check()?;
        Ok(Comment {
            body: body.to_string(),
            ..comment.clone()
        })
    }

    async fn delete_comment(&self, _pr: &PullRequestRef, _id: CommentId) -> Result<()> {
        self.check()
    }

    async fn start_review(&self, _pr: &PullRequestRef) -> Result<()> {
        self.check()?;
        self.state.lock().unwrap().in_draft = true;
        Ok(())
    }

    async fn submit_review(&self, _pr: &PullRequestRef) -> Result<()> {
        self.check()?;
        self.state.lock().unwrap().in_draft = false;
        Ok(())
    }

    async fn delete_review(&self, _pr: &PullRequestRef) -> Result<DeletedReview> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        state.in_draft = false;
        Ok(DeletedReview {
            review_id: 9,
            comments: std::mem::take(&mut state.review_comments),
        })
    }

    async fn is_in_draft_mode(&self, _pr: &PullRequestRef) -> Result<bool> {
        let state = self.state.lock().unwrap();
        if state.fail_draft_query {
            bail!("GraphQL unavailable");
        }
        Ok(state.in_draft)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn comment(id: CommentId, position: u32, body: &str) -> Comment {
    Comment {
        id,
        path: PATH.to_string(),
        original_commit_id: "head1".to_string(),
        diff_hunk: PR_PATCH.to_string(),
        original_position: position,
        position: Some(position),
        body: body.to_string(),
        author: "alice".to_string(),
        is_draft: false,
        pull_request_review_id: None,
        created_at: None,
        absolute_position: None,
    }
}

fn outdated(id: CommentId, original_position: u32, commit: &str) -> Comment {
    Comment {
        position: None,
        original_commit_id: commit.to_string(),
        original_position,
        ..comment(id, original_position, "outdated")
    }
}

fn initial_comments() -> Vec<Comment> {
    vec![
        comment(1, 2, "first"),
        comment(2, 2, "second"),
        comment(3, 7, "third"),
        outdated(4, 3, "old1"),
    ]
}

fn pull_request(supports_drafts: bool) -> PullRequestRef {
    PullRequestRef {
        number: 7,
        head_sha: "head1".to_string(),
        supports_drafts,
    }
}

fn session(comments: Vec<Comment>) -> ReviewSession {
    ReviewSession {
        pull_request: Some(pull_request(true)),
        local_changes: vec![FileChange::Local(
            LocalFileChange::from_patch(PATH, "head1", "base1", PR_PATCH).unwrap(),
        )],
        obsolete_changes: Vec::new(),
        comments,
    }
}

struct Harness {
    provider: CommentProvider,
    diffs: Arc<FakeDiffs>,
    backend: Arc<FakeBackend>,
    documents: Arc<Mutex<Vec<DocumentThreadChangeEvent>>>,
    workspace: Arc<Mutex<Vec<ThreadChangeEvent>>>,
    lists: Arc<Mutex<Vec<CommentsChangedEvent>>>,
}

fn harness_with(diffs: FakeDiffs, session: ReviewSession) -> Harness {
    let diffs = Arc::new(diffs);
    let backend = Arc::new(FakeBackend::default());
    let mut provider = CommentProvider::new(
        ProviderConfig::new("/repo"),
        diffs.clone(),
        backend.clone(),
        session,
    );

    let documents = Arc::new(Mutex::new(Vec::new()));
    let workspace = Arc::new(Mutex::new(Vec::new()));
    let lists = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&documents);
    provider.on_document_threads_changed(move |e| sink.lock().unwrap().push(e.clone()));
    let sink = Arc::clone(&workspace);
    provider.on_workspace_threads_changed(move |e| sink.lock().unwrap().push(e.clone()));
    let sink = Arc::clone(&lists);
    provider.on_comments_changed(move |e| sink.lock().unwrap().push(e.clone()));

    Harness {
        provider,
        diffs,
        backend,
        documents,
        workspace,
        lists,
    }
}

fn harness() -> Harness {
    harness_with(
        FakeDiffs {
            working_diff: WORKING_DIFF.to_string(),
            ..FakeDiffs::default()
        },
        session(initial_comments()),
    )
}

fn live_document() -> Document {
    Document::new(
        DocumentUri::File {
            path: PathBuf::from("/repo/src/a.ts"),
        },
        "x\ny\none\ntwo\nthree\n",
    )
}

fn pr_document(base: bool) -> Document {
    Document::new(
        DocumentUri::PullRequest {
            path: PATH.to_string(),
            base,
        },
        "",
    )
}

fn thread_ids(threads: &[CommentThread]) -> Vec<u64> {
    threads.iter().map(|t| t.thread_id.comment_id()).collect()
}

fn comment_ids(thread: &CommentThread) -> Vec<u64> {
    thread.comments.iter().map(|c| c.comment_id).collect()
}

// ---------------------------------------------------------------------------
// Read path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_pull_request_head_view() {
    let h = harness();
    let info = h
        .provider
        .provide_document_comments(&pr_document(false))
        .await
        .expect("info");

    assert_eq!(thread_ids(&info.threads), vec![1, 3]);
    assert_eq!(comment_ids(&info.threads[0]), vec![1, 2]);
    assert_eq!(info.threads[0].range, Range::point(1));
    assert_eq!(info.threads[1].range, Range::point(11));
    assert_eq!(info.threads[0].collapsible_state, CollapsibleState::Expanded);
    assert_eq!(
        info.commenting_ranges,
        vec![Range::lines(0, 3), Range::lines(10, 12)]
    );
    assert!(!info.in_draft_mode);
}

#[tokio::test]
async fn test_pull_request_base_view_skips_added_lines() {
    let h = harness();
    let info = h
        .provider
        .provide_document_comments(&pr_document(true))
        .await
        .expect("info");
    assert!(info.threads.is_empty());
    assert_eq!(
        info.commenting_ranges,
        vec![Range::lines(0, 2), Range::lines(9, 10)]
    );
}

#[tokio::test]
async fn test_live_file_view_follows_working_copy() {
    let h = harness();
    let info = h
        .provider
        .provide_document_comments(&live_document())
        .await
        .expect("info");

    assert_eq!(thread_ids(&info.threads), vec![1, 3, 4]);
    let lines: Vec<u32> = info.threads.iter().map(|t| t.range.start.line).collect();
    assert_eq!(lines, vec![3, 13, 4]);
    assert!(info
        .threads
        .iter()
        .all(|t| t.collapsible_state == CollapsibleState::Collapsed));
    assert_eq!(
        info.commenting_ranges,
        vec![Range::lines(2, 5), Range::lines(12, 14)]
    );
    assert_eq!(
        *h.diffs.calls.lock().unwrap(),
        vec![format!("diff_between head1 working tree {PATH}")]
    );
}

#[tokio::test]
async fn test_dirty_buffer_diffs_blobs() {
    let h = harness_with(
        FakeDiffs {
            blob_diff: "@@ -1,0 +2 @@\n+inserted\n".to_string(),
            ..FakeDiffs::default()
        },
        session(initial_comments()),
    );
    let info = h
        .provider
        .provide_document_comments(&live_document().dirty())
        .await
        .expect("info");

    // Head line 2 is now line 3
    assert_eq!(info.threads[0].range, Range::point(2));
    assert_eq!(
        *h.diffs.calls.lock().unwrap(),
        vec![
            format!("blob_id_at head1 {PATH}"),
            "hash_content".to_string(),
            "diff_blobs head-blob buffer-blob".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_live_view_degrades_when_diff_fails() {
    let h = harness_with(
        FakeDiffs {
            fail: true,
            ..FakeDiffs::default()
        },
        session(initial_comments()),
    );
    assert!(h
        .provider
        .provide_document_comments(&live_document())
        .await
        .is_none());
}

#[tokio::test]
async fn test_unknown_documents_yield_nothing() {
    let h = harness();
    let outside = Document::new(
        DocumentUri::File {
            path: PathBuf::from("/elsewhere/a.ts"),
        },
        "",
    );
    assert!(h.provider.provide_document_comments(&outside).await.is_none());

    let unchanged = Document::new(
        DocumentUri::File {
            path: PathBuf::from("/repo/src/unchanged.ts"),
        },
        "",
    );
    assert!(h
        .provider
        .provide_document_comments(&unchanged)
        .await
        .is_none());
}

#[tokio::test]
async fn test_review_view_of_old_commit_shows_outdated_threads() {
    let h = harness();
    let base = Document::new(
        DocumentUri::Review(ReviewQuery {
            path: PATH.to_string(),
            commit: "old1^".to_string(),
            base: true,
            is_outdated: true,
        }),
        "",
    );
    let info = h
        .provider
        .provide_document_comments(&base)
        .await
        .expect("info");
    // Position 3 of the captured hunk is " three" (old line 2)
    assert_eq!(thread_ids(&info.threads), vec![4]);
    assert_eq!(info.threads[0].range, Range::point(1));
    assert!(info.commenting_ranges.is_empty());

    let head = Document::new(
        DocumentUri::Review(ReviewQuery {
            path: PATH.to_string(),
            commit: "old1".to_string(),
            base: false,
            is_outdated: true,
        }),
        "",
    );
    // A context line has an old line, so the head side does not show it
    let info = h
        .provider
        .provide_document_comments(&head)
        .await
        .expect("info");
    assert!(info.threads.is_empty());
}

#[tokio::test]
async fn test_draft_mode_query_failure_reads_as_false() {
    let h = harness();
    h.backend.state.lock().unwrap().in_draft = true;
    assert!(h.provider.in_draft_mode().await);
    h.backend.state.lock().unwrap().fail_draft_query = true;
    assert!(!h.provider.in_draft_mode().await);
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reply_appends_to_thread() {
    let mut h = harness();
    let info = h
        .provider
        .provide_document_comments(&pr_document(false))
        .await
        .expect("info");

    let updated = h
        .provider
        .reply_to_thread(&pr_document(false), &info.threads[0], "agreed")
        .await
        .expect("reply");

    assert_eq!(comment_ids(&updated), vec![1, 2, 101]);
    assert!(h.provider.store().contains(101));
    assert_eq!(h.lists.lock().unwrap().len(), 1);
    let workspace = h.workspace.lock().unwrap();
    assert_eq!(thread_ids(&workspace[0].changed), vec![1]);
}

#[tokio::test]
async fn test_reply_to_unknown_thread() {
    let mut h = harness();
    let info = h
        .provider
        .provide_document_comments(&pr_document(false))
        .await
        .expect("info");
    let mut thread = info.threads[0].clone();
    thread.thread_id = reanchor_core::threads::ThreadId(999);

    let err = h
        .provider
        .reply_to_thread(&pr_document(false), &thread, "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ThreadNotFound { .. }));
}

#[tokio::test]
async fn test_create_thread_maps_working_copy_line() {
    let mut h = harness();
    // Working-copy line 4 (0-based 3) is head line 2, the "+two" line
    let thread = h
        .provider
        .create_thread(&live_document(), Range::point(3), "why?")
        .await
        .expect("thread");

    assert_eq!(
        h.backend.state.lock().unwrap().created,
        vec![(PATH.to_string(), 2)]
    );
    assert_eq!(thread.thread_id.comment_id(), 101);
    assert_eq!(thread.key.position, 2);
    let workspace = h.workspace.lock().unwrap();
    assert_eq!(thread_ids(&workspace[0].added), vec![101]);
}

#[tokio::test]
async fn test_create_thread_on_diff_view_returns_diff_resource() {
    let mut h = harness();
    let head = h
        .provider
        .create_thread(&pr_document(false), Range::point(1), "why?")
        .await
        .expect("head thread");
    assert_eq!(
        head.resource,
        Resource::Diff {
            path: PATH.to_string(),
            commit: "head1".to_string(),
            base: false,
        }
    );

    let base = h
        .provider
        .create_thread(&pr_document(true), Range::point(0), "and this?")
        .await
        .expect("base thread");
    assert_eq!(
        base.resource,
        Resource::Diff {
            path: PATH.to_string(),
            commit: "base1".to_string(),
            base: true,
        }
    );

    // The workspace always hears about the live file
    let workspace = h.workspace.lock().unwrap();
    assert_eq!(workspace.len(), 2);
    for event in workspace.iter() {
        assert_eq!(
            event.added[0].resource,
            Resource::File {
                path: PathBuf::from("/repo/src/a.ts")
            }
        );
    }
}

#[tokio::test]
async fn test_create_thread_on_unrepresentable_line() {
    let mut h = harness();
    // Working-copy line 1 does not exist at the head commit
    let err = h
        .provider
        .create_thread(&live_document(), Range::point(0), "here")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PositionUnrepresentable { line: 1, .. }));
    assert!(h.backend.state.lock().unwrap().created.is_empty());
}

#[tokio::test]
async fn test_create_thread_preconditions() {
    let mut h = harness_with(
        FakeDiffs::default(),
        ReviewSession {
            pull_request: None,
            ..session(Vec::new())
        },
    );
    let err = h
        .provider
        .create_thread(&pr_document(false), Range::point(1), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoActivePullRequest));

    let mut h = harness();
    let missing = Document::new(
        DocumentUri::PullRequest {
            path: "src/missing.ts".to_string(),
            base: false,
        },
        "",
    );
    let err = h
        .provider
        .create_thread(&missing, Range::point(1), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::FileNotFound { .. }));
}

#[tokio::test]
async fn test_backend_failure_is_wrapped() {
    let mut h = harness();
    h.backend.state.lock().unwrap().fail = true;
    let err = h
        .provider
        .create_thread(&pr_document(false), Range::point(1), "x")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Review backend error: HTTP 502");
    assert!(h.lists.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_edit_comment_publishes_changed_thread() {
    let mut h = harness();
    let edited = h
        .provider
        .edit_comment(&pr_document(false), 2, "second, edited")
        .await
        .expect("edit");
    assert_eq!(edited.body, "second, edited");
    assert_eq!(
        h.provider.store().get(2).map(|c| c.body.as_str()),
        Some("second, edited")
    );
    let workspace = h.workspace.lock().unwrap();
    assert_eq!(thread_ids(&workspace[0].changed), vec![1]);

    drop(workspace);
    let err = h
        .provider
        .edit_comment(&pr_document(false), 55, "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::CommentNotFound { comment_id: 55 }));
}

#[tokio::test]
async fn test_delete_first_comment_regroups_thread() {
    let mut h = harness();
    h.provider
        .delete_comment(&pr_document(false), 1)
        .await
        .expect("delete");

    let documents = h.documents.lock().unwrap();
    let event = &documents[0];
    assert!(event.threads.removed.is_empty());
    assert_eq!(thread_ids(&event.threads.changed), vec![2]);
    assert_eq!(comment_ids(&event.threads.changed[0]), vec![2]);
    assert_eq!(h.workspace.lock().unwrap()[0], event.threads);
}

#[tokio::test]
async fn test_delete_last_comment_removes_thread() {
    let mut h = harness();
    h.provider
        .delete_comment(&pr_document(false), 3)
        .await
        .expect("delete");

    let documents = h.documents.lock().unwrap();
    assert_eq!(thread_ids(&documents[0].threads.removed), vec![3]);
    assert!(documents[0].threads.changed.is_empty());
    assert!(!h.provider.store().contains(3));
    assert_eq!(h.lists.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_outdated_comment_leaves_other_threads_alone() {
    let mut h = harness_with(
        FakeDiffs::default(),
        session(vec![outdated(10, 2, "old1"), outdated(11, 7, "old1")]),
    );
    h.provider
        .delete_comment(&pr_document(false), 10)
        .await
        .expect("delete");

    let documents = h.documents.lock().unwrap();
    assert_eq!(thread_ids(&documents[0].threads.removed), vec![10]);
    assert!(documents[0].threads.changed.is_empty());
    assert!(h.provider.store().contains(11));
}

#[tokio::test]
async fn test_edit_outdated_comment_reports_only_its_thread() {
    let mut h = harness_with(
        FakeDiffs::default(),
        session(vec![outdated(10, 2, "old1"), outdated(11, 7, "old1")]),
    );
    h.provider
        .edit_comment(&pr_document(false), 10, "still relevant")
        .await
        .expect("edit");

    let workspace = h.workspace.lock().unwrap();
    assert_eq!(workspace.len(), 1);
    assert_eq!(thread_ids(&workspace[0].changed), vec![10]);
    assert_eq!(comment_ids(&workspace[0].changed[0]), vec![10]);
}

// ---------------------------------------------------------------------------
// Drafts and updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_start_draft_announces_draft_mode() {
    let mut h = harness();
    h.provider.start_draft().await.expect("start");
    let documents = h.documents.lock().unwrap();
    assert_eq!(documents.len(), 1);
    assert!(documents[0].in_draft_mode);
    assert!(documents[0].threads.is_empty());
    assert!(h.provider.draft_labels().is_some());
}

#[tokio::test]
async fn test_drafts_require_support() {
    let mut h = harness_with(
        FakeDiffs::default(),
        ReviewSession {
            pull_request: Some(pull_request(false)),
            ..session(Vec::new())
        },
    );
    let err = h.provider.start_draft().await.unwrap_err();
    assert!(matches!(err, CoreError::DraftsUnsupported { number: 7 }));
    assert!(h.provider.draft_labels().is_none());
}

#[tokio::test]
async fn test_delete_draft_drops_review_comments() {
    let mut draft_reply = comment(5, 2, "pending reply");
    draft_reply.is_draft = true;
    draft_reply.pull_request_review_id = Some(9);
    let mut draft_thread = comment(6, 8, "pending thread");
    draft_thread.is_draft = true;
    draft_thread.pull_request_review_id = Some(9);

    let mut comments = initial_comments();
    comments.push(draft_reply.clone());
    comments.push(draft_thread.clone());
    let mut h = harness_with(FakeDiffs::default(), session(comments));
    h.backend.state.lock().unwrap().review_comments = vec![draft_reply, draft_thread];

    h.provider.delete_draft().await.expect("delete draft");

    assert!(!h.provider.store().contains(5));
    assert!(!h.provider.store().contains(6));
    let documents = h.documents.lock().unwrap();
    let event = &documents[0];
    assert!(!event.in_draft_mode);
    assert_eq!(thread_ids(&event.threads.changed), vec![1]);
    assert_eq!(comment_ids(&event.threads.changed[0]), vec![1, 2]);
    assert_eq!(thread_ids(&event.threads.removed), vec![6]);
}

#[tokio::test]
async fn test_review_submitted_clears_drafts() {
    let mut pending = comment(5, 2, "pending");
    pending.is_draft = true;
    let mut comments = initial_comments();
    comments.push(pending.clone());
    let mut h = harness_with(FakeDiffs::default(), session(comments));

    h.provider.finish_draft().await.expect("submit");
    h.provider.review_submitted(&[pending]);

    assert!(h.provider.store().iter().all(|c| !c.is_draft));
    let documents = h.documents.lock().unwrap();
    assert!(!documents[0].in_draft_mode);
    assert_eq!(thread_ids(&documents[0].threads.changed), vec![1, 3, 4]);
}

#[tokio::test]
async fn test_update_with_same_list_publishes_nothing() {
    let mut h = harness();
    let delta = h.provider.update_comments(initial_comments()).await;
    assert!(delta.is_empty());
    assert!(h.documents.lock().unwrap().is_empty());
    assert!(h.workspace.lock().unwrap().is_empty());
    assert!(h.lists.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_publishes_delta() {
    let mut h = harness();
    let mut next = initial_comments();
    next[0].body = "first, edited".to_string();
    next.retain(|c| c.id != 3);
    next.push(comment(8, 6, "new"));

    let delta = h.provider.update_comments(next).await;
    assert_eq!(thread_ids(&delta.changed), vec![1]);
    assert_eq!(thread_ids(&delta.removed), vec![3]);
    assert_eq!(thread_ids(&delta.added), vec![8]);
    assert_eq!(delta.added[0].collapsible_state, CollapsibleState::Collapsed);

    assert_eq!(h.documents.lock().unwrap()[0].threads, delta);
    assert_eq!(h.workspace.lock().unwrap()[0], delta);
    assert_eq!(h.lists.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_update_skips_comments_without_a_line() {
    let mut h = harness();
    let mut next = initial_comments();
    // Original position 30 lies past every hunk of the current diff
    next.push(outdated(50, 30, "old1"));

    let delta = h.provider.update_comments(next).await;
    assert!(delta.is_empty());
    assert!(h.workspace.lock().unwrap().is_empty());
    assert!(h.documents.lock().unwrap().is_empty());
    assert_eq!(h.lists.lock().unwrap().len(), 1);
    assert!(h.provider.store().contains(50));
}

#[tokio::test]
async fn test_unsubscribe_and_dispose() {
    let mut h = harness();
    let count = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&count);
    let id = h
        .provider
        .on_comments_changed(move |_| *sink.lock().unwrap() += 1);
    assert!(h.provider.unsubscribe(id));
    assert!(!h.provider.unsubscribe(id));

    h.provider.dispose();
    h.provider
        .delete_comment(&pr_document(false), 3)
        .await
        .expect("delete");
    assert_eq!(*count.lock().unwrap(), 0);
    assert!(h.lists.lock().unwrap().is_empty());
    assert!(h.documents.lock().unwrap().is_empty());
}
