//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reanchor_core::model::Comment;

/// Read a whole input file.
pub fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Read a JSON array of comments.
pub fn read_comments(path: &Path) -> Result<Vec<Comment>> {
    let text = read_input(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse comments from {}", path.display()))
}
