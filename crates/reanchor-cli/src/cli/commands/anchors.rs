//! `reanchor anchor` and `reanchor worktree`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use reanchor_core::anchor::{map_comments_to_head, reanchor_comment, Anchor};
use reanchor_core::diff::{parse_hunks, LineMap};
use reanchor_core::model::Comment;
use reanchor_core::scm::{
    validate_ref, validate_repo_relative_path, DiffProvider, GitDiffProvider, Revision,
};

use super::helpers::{read_comments, read_input};
use crate::output::{Formatter, OutputFormat};

/// Where one comment lands now.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Placement {
    pub comment_id: u64,
    pub path: String,
    pub status: &'static str,
    pub original_line: Option<u32>,
    pub line: Option<u32>,
}

impl Placement {
    fn from_anchor(comment: &Comment, anchor: &Anchor) -> Self {
        let (status, original_line) = match anchor {
            Anchor::Unchanged { current_line } => ("unchanged", Some(*current_line)),
            Anchor::Shifted { original_line, .. } => ("shifted", Some(*original_line)),
            Anchor::Deleted => ("deleted", None),
            Anchor::Outdated => ("outdated", None),
        };
        Self {
            comment_id: comment.id,
            path: comment.path.clone(),
            status,
            original_line,
            line: anchor.current_line(),
        }
    }
}

/// Re-anchor each comment's captured hunk through `diff`.
pub fn anchor_comments(comments: &[Comment], diff: &str) -> Result<Vec<Placement>> {
    let current = LineMap::parse(diff)?;
    comments
        .iter()
        .map(|c| {
            let anchor = reanchor_comment(c, &current)
                .with_context(|| format!("Comment {} has an unreadable diff hunk", c.id))?;
            Ok(Placement::from_anchor(c, &anchor))
        })
        .collect()
}

/// Place the comments on `path` in the working copy, given the diff from
/// the head commit to the working copy.
pub fn place_in_worktree(
    path: &str,
    pr_diff: &str,
    content_diff: &str,
    comments: &[Comment],
) -> Result<Vec<Placement>> {
    let hunks = parse_hunks(pr_diff)?;
    let map = LineMap::parse(content_diff)?;
    let on_path: Vec<&Comment> = comments.iter().filter(|c| c.path == path).collect();
    let placed = map_comments_to_head(&hunks, &map, on_path.iter().copied());

    Ok(on_path
        .iter()
        .map(|c| {
            let line = placed
                .iter()
                .find(|p| p.id == c.id)
                .and_then(|p| p.absolute_position);
            Placement {
                comment_id: c.id,
                path: c.path.clone(),
                status: if line.is_some() { "placed" } else { "unanchored" },
                original_line: None,
                line,
            }
        })
        .collect())
}

pub fn run_anchor(comments: &Path, diff: &Path, format: OutputFormat) -> Result<()> {
    let placements = anchor_comments(&read_comments(comments)?, &read_input(diff)?)?;
    Formatter::new(format).print_list(&placements, "No comments", "placements")
}

pub fn run_worktree(
    root: PathBuf,
    path: &str,
    head: &str,
    pr_diff: &Path,
    comments: &Path,
    format: OutputFormat,
) -> Result<()> {
    validate_repo_relative_path(path)?;
    validate_ref(head)?;
    let pr_diff = read_input(pr_diff)?;
    let comments = read_comments(comments)?;

    let provider = GitDiffProvider::new(root);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let content_diff = runtime
        .block_on(provider.diff_between(head, &Revision::WorkingTree, path))
        .with_context(|| format!("Failed to diff {path} against {head}"))?;
    info!(path, head, bytes = content_diff.len(), "working copy diff loaded");

    let placements = place_in_worktree(path, &pr_diff, &content_diff, &comments)?;
    Formatter::new(format).print_list(&placements, "No comments on this file", "placements")
}
