//! Comment re-anchoring.
//!
//! A comment is recorded against a diff position in the pull request diff of
//! some commit, together with the hunk text captured at that moment. As the
//! file moves on (new commits, local edits) we need to know where that line
//! lives now, or whether it is gone.
//!
//! Every "where does this comment land" query goes through [`locate`]: look
//! up the line at a diff position, pick a side, and optionally push the line
//! through a newer diff. Base, head and working-copy views differ only in the
//! hunks, side and content diff they feed in.

use tracing::debug;

use crate::diff::{
    diff_line_at, last_diff_line, parse_hunks, DiffError, DiffHunk, DiffLine, DiffSide, LineMap,
};
use crate::model::Comment;

/// Result of re-anchoring a comment against the current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// The anchored line is still at the same line number.
    Unchanged {
        /// The current line number (same as original).
        current_line: u32,
    },
    /// The anchored line moved due to insertions/deletions above it.
    Shifted {
        /// The line number recorded in the captured hunk.
        original_line: u32,
        /// The current line number after the move.
        current_line: u32,
    },
    /// The anchored line no longer exists in the current content.
    Deleted,
    /// The captured hunk holds no line to anchor to.
    Outdated,
}

impl Anchor {
    /// Get the current line number if the line still exists.
    #[must_use]
    pub const fn current_line(&self) -> Option<u32> {
        match self {
            Self::Unchanged { current_line } | Self::Shifted { current_line, .. } => {
                Some(*current_line)
            }
            Self::Deleted | Self::Outdated => None,
        }
    }

    /// Whether the comment belongs in the active view.
    #[must_use]
    pub const fn is_anchored(&self) -> bool {
        matches!(self, Self::Unchanged { .. } | Self::Shifted { .. })
    }
}

/// Absolute line of the diff line at `position`.
///
/// With `side` set, the line number on that side; otherwise the line's own
/// side (old for deletions, new for everything else). With `content_diff`
/// set, the line is then mapped from the old to the new side of that diff.
#[must_use]
pub fn locate(
    hunks: &[DiffHunk],
    position: u32,
    side: Option<DiffSide>,
    content_diff: Option<&LineMap>,
) -> Option<u32> {
    let line = diff_line_at(hunks, position)?;
    let absolute = match side {
        Some(side) => line.line_on(side)?,
        None => line.own_line()?,
    };
    match content_diff {
        Some(map) => map.map_old_to_new(absolute),
        None => Some(absolute),
    }
}

/// The line a comment's captured hunk points at.
///
/// The captured text ends at the commented line, so when `original_position`
/// is not a line inside the captured text (the comment sat in a later hunk of
/// the file) the last line is the anchor.
pub fn captured_anchor_line(
    diff_hunk: &str,
    original_position: u32,
) -> Result<Option<DiffLine>, DiffError> {
    let hunks = parse_hunks(diff_hunk)?;
    let line = diff_line_at(&hunks, original_position).or_else(|| last_diff_line(&hunks));
    Ok(line.cloned())
}

/// Re-anchor a captured hunk position against the diff from the comment's
/// commit to the current content.
pub fn reanchor(
    diff_hunk: &str,
    original_position: u32,
    current: &LineMap,
) -> Result<Anchor, DiffError> {
    let Some(anchor) = captured_anchor_line(diff_hunk, original_position)? else {
        return Ok(Anchor::Outdated);
    };
    let Some(original_line) = anchor.own_line() else {
        return Ok(Anchor::Outdated);
    };

    Ok(match current.map_old_to_new(original_line) {
        None => Anchor::Deleted,
        Some(current_line) if current_line == original_line => Anchor::Unchanged { current_line },
        Some(current_line) => Anchor::Shifted {
            original_line,
            current_line,
        },
    })
}

/// Re-anchor a stored comment. A hunk that fails to parse is reported as an error.
pub fn reanchor_comment(comment: &Comment, current: &LineMap) -> Result<Anchor, DiffError> {
    reanchor(&comment.diff_hunk, comment.original_position, current)
}

/// Absolute line of an active comment on one side of a diff view.
///
/// Outdated comments have no current position and return `None`.
#[must_use]
pub fn absolute_position(comment: &Comment, hunks: &[DiffHunk], side: DiffSide) -> Option<u32> {
    locate(hunks, comment.position?, Some(side), None)
}

/// Copies of the active comments that land on `side` of a diff view, with
/// their absolute position set.
pub fn anchor_comments_in_diff<'a>(
    comments: impl IntoIterator<Item = &'a Comment>,
    hunks: &[DiffHunk],
    side: DiffSide,
) -> Vec<Comment> {
    comments
        .into_iter()
        .filter_map(|c| match absolute_position(c, hunks, side) {
            Some(line) => Some(c.located_at(line)),
            None => {
                debug!(comment_id = c.id, side = side.as_str(), "comment not on this side");
                None
            }
        })
        .collect()
}

/// Copies of `comments` placed in the live document.
///
/// Each comment's line in the pull request diff (`position`, falling back to
/// `original_position`) is pushed through `content_diff`, the diff from the
/// head commit to the working copy. Comments without a line there are left
/// out; the records themselves are untouched.
pub fn map_comments_to_head<'a>(
    hunks: &[DiffHunk],
    content_diff: &LineMap,
    comments: impl IntoIterator<Item = &'a Comment>,
) -> Vec<Comment> {
    comments
        .into_iter()
        .filter_map(|c| {
            match locate(hunks, c.anchor_position(), None, Some(content_diff)) {
                Some(line) => Some(c.located_at(line)),
                None => {
                    debug!(comment_id = c.id, path = %c.path, "comment unanchored in working copy");
                    None
                }
            }
        })
        .collect()
}

/// Line at which an outdated comment is shown in a diff view of its own commit.
///
/// The base side uses the anchor's old line; the head side uses its new line
/// only when the anchor is an addition.
pub fn outdated_anchor_line(comment: &Comment, side: DiffSide) -> Result<Option<u32>, DiffError> {
    let Some(anchor) = captured_anchor_line(&comment.diff_hunk, comment.original_position)? else {
        return Ok(None);
    };
    Ok(match side {
        DiffSide::Base => anchor.old_line,
        DiffSide::Head if anchor.old_line.is_none() => anchor.new_line,
        DiffSide::Head => None,
    })
}
