//! `reanchor threads` and `reanchor reconcile`.

use std::path::Path;

use anyhow::Result;

use reanchor_core::model::Comment;
use reanchor_core::threads::{
    comments_to_threads, reconcile, CollapsibleState, CommentThread, Resource, ThreadChangeEvent,
};

use super::helpers::read_comments;
use crate::output::{Formatter, OutputFormat};

pub fn group_threads(root: &Path, comments: &[Comment]) -> Vec<CommentThread> {
    comments_to_threads(
        comments,
        |path| Resource::file(root, path),
        CollapsibleState::Expanded,
    )
}

pub fn thread_delta(root: &Path, old: &[Comment], new: &[Comment]) -> ThreadChangeEvent {
    reconcile(
        old,
        new,
        |path| Resource::file(root, path),
        CollapsibleState::Expanded,
    )
}

pub fn run_threads(root: &Path, comments: &Path, format: OutputFormat) -> Result<()> {
    let threads = group_threads(root, &read_comments(comments)?);
    Formatter::new(format).print_list(&threads, "No threads", "threads")
}

pub fn run_reconcile(root: &Path, old: &Path, new: &Path, format: OutputFormat) -> Result<()> {
    let delta = thread_delta(root, &read_comments(old)?, &read_comments(new)?);
    if delta.is_empty() && format == OutputFormat::Text {
        println!("No thread changes");
        return Ok(());
    }
    Formatter::new(format).print(&delta)
}
