//! Unified diff parsing.
//!
//! Parses the `@@ ... @@` sections of a single-file unified diff into hunks
//! whose lines carry old/new line numbers and PR-style diff positions: the
//! first hunk header sits at position 0 and every following physical line,
//! later hunk headers included, takes the next position.

pub mod line_map;
pub mod position;

pub use line_map::{map_new_to_old, map_old_to_new, LineMap};
pub use position::{
    absolute_to_position, commenting_ranges, diff_line_at, position_to_absolute, LineRange,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while parsing a unified diff.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// A line starting with `@@` could not be parsed as a hunk header.
    #[error("Invalid hunk header: {line}")]
    InvalidHunkHeader { line: String },
}

/// Which version of the file a line number refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DiffSide {
    /// The old file (base commit, `-` lines).
    Base,
    /// The new file (head commit, `+` lines).
    Head,
}

impl DiffSide {
    #[must_use]
    pub const fn from_base(is_base: bool) -> Self {
        if is_base {
            Self::Base
        } else {
            Self::Head
        }
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Base => Self::Head,
            Self::Head => Self::Base,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Head => "head",
        }
    }
}

/// A parsed hunk header.
///
/// Format: `@@ -old_start,old_count +new_start,new_count @@ [section]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkHeader {
    /// Start line in the old file (1-indexed, 0 for an empty old side).
    pub old_start: u32,
    /// Number of lines in the old file.
    pub old_count: u32,
    /// Start line in the new file (1-indexed, 0 for an empty new side).
    pub new_start: u32,
    /// Number of lines in the new file.
    pub new_count: u32,
}

impl HunkHeader {
    /// Parse a hunk header line.
    ///
    /// Handles formats:
    /// - `@@ -1,5 +1,7 @@` (standard)
    /// - `@@ -1 +1 @@` (count defaults to 1)
    /// - `@@ -0,0 +1,3 @@` (new file)
    /// - `@@ -10,6 +10,8 @@ fn main() {` (section heading)
    pub fn parse(line: &str) -> Result<Self, DiffError> {
        let invalid = || DiffError::InvalidHunkHeader {
            line: line.to_string(),
        };

        let rest = line.trim().strip_prefix("@@").ok_or_else(invalid)?;
        let range_part = rest.find("@@").map_or(rest, |idx| &rest[..idx]);

        let mut parts = range_part.split_whitespace();
        let old = parts.next().ok_or_else(invalid)?;
        let new = parts.next().ok_or_else(invalid)?;

        let (old_start, old_count) = Self::parse_range(old, '-').ok_or_else(invalid)?;
        let (new_start, new_count) = Self::parse_range(new, '+').ok_or_else(invalid)?;

        Ok(Self {
            old_start,
            old_count,
            new_start,
            new_count,
        })
    }

    /// Parse a range like `-1,5` or `+1` into (start, count).
    fn parse_range(s: &str, prefix: char) -> Option<(u32, u32)> {
        let s = s.strip_prefix(prefix)?;

        if let Some((start, count)) = s.split_once(',') {
            Some((start.parse().ok()?, count.parse().ok()?))
        } else {
            // No comma means count is 1
            Some((s.parse().ok()?, 1))
        }
    }

    /// The (start, count) range the hunk covers on one side.
    #[must_use]
    pub const fn range(&self, side: DiffSide) -> (u32, u32) {
        match side {
            DiffSide::Base => (self.old_start, self.old_count),
            DiffSide::Head => (self.new_start, self.new_count),
        }
    }

    /// First line on `side` that belongs to this hunk.
    ///
    /// A side with zero lines sits *after* its start line, so the first line
    /// that comes after the hunk is `start + 1`.
    #[must_use]
    pub const fn first_line(&self, side: DiffSide) -> u32 {
        let (start, count) = self.range(side);
        if count == 0 {
            start.saturating_add(1)
        } else {
            start
        }
    }

    /// Last line on `side` that belongs to this hunk (the start line for an empty side).
    #[must_use]
    pub const fn last_line(&self, side: DiffSide) -> u32 {
        let (start, count) = self.range(side);
        if count == 0 {
            start
        } else {
            start.saturating_add(count - 1)
        }
    }

    /// Whether `line` lies inside the hunk's range on `side`.
    #[must_use]
    pub const fn contains(&self, side: DiffSide, line: u32) -> bool {
        let (start, count) = self.range(side);
        count > 0 && line >= start && line - start < count
    }
}

/// Kind of a line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Line exists in both old and new (starts with space).
    Context,
    /// Line was added (starts with `+`).
    Added,
    /// Line was deleted (starts with `-`).
    Deleted,
}

/// One physical line inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line number in the old file (context and deleted lines).
    pub old_line: Option<u32>,
    /// Line number in the new file (context and added lines).
    pub new_line: Option<u32>,
    /// Diff position of this line.
    pub position: u32,
    /// Raw text including the `+`/`-`/` ` prefix.
    pub text: String,
}

impl DiffLine {
    /// The line number on `side`, if the line exists there.
    #[must_use]
    pub const fn line_on(&self, side: DiffSide) -> Option<u32> {
        match side {
            DiffSide::Base => self.old_line,
            DiffSide::Head => self.new_line,
        }
    }

    /// The line number on the side this line naturally belongs to:
    /// the old line for deletions, the new line otherwise.
    #[must_use]
    pub const fn own_line(&self) -> Option<u32> {
        match self.kind {
            LineKind::Deleted => self.old_line,
            LineKind::Context | LineKind::Added => self.new_line,
        }
    }
}

/// A contiguous block of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffHunk {
    pub header: HunkHeader,
    /// Diff position of the `@@` header line.
    pub position: u32,
    /// Diff position of the last physical line of this hunk.
    pub end_position: u32,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Look up the line at a diff position inside this hunk.
    #[must_use]
    pub fn line_at(&self, position: u32) -> Option<&DiffLine> {
        if position <= self.position || position > self.end_position {
            return None;
        }
        self.lines.iter().find(|l| l.position == position)
    }

    /// Look up the line carrying `line` on `side`.
    #[must_use]
    pub fn line_numbered(&self, side: DiffSide, line: u32) -> Option<&DiffLine> {
        self.lines.iter().find(|l| l.line_on(side) == Some(line))
    }
}

/// Line numbers still expected by the hunk being parsed.
struct OpenHunk {
    old_line: u32,
    new_line: u32,
    old_remaining: u32,
    new_remaining: u32,
}

impl OpenHunk {
    const fn exhausted(&self) -> bool {
        self.old_remaining == 0 && self.new_remaining == 0
    }
}

/// Parse the hunks of a single-file unified diff.
///
/// File headers (`diff --git`, `index`, `---`, `+++`) are skipped. A hunk
/// ends once the line counts announced by its header are consumed, so a
/// truncated hunk (as captured with a review comment) parses fine. A
/// `diff ` line starts a new file and restarts position numbering.
pub fn parse_hunks(diff: &str) -> Result<Vec<DiffHunk>, DiffError> {
    let mut hunks: Vec<DiffHunk> = Vec::new();
    let mut position: Option<u32> = None;
    let mut open: Option<OpenHunk> = None;

    for line in diff.lines() {
        if line.starts_with("@@") {
            let header = HunkHeader::parse(line)?;
            let header_position = position.map_or(0, |p| p.saturating_add(1));
            position = Some(header_position);
            open = Some(OpenHunk {
                old_line: header.old_start,
                new_line: header.new_start,
                old_remaining: header.old_count,
                new_remaining: header.new_count,
            });
            hunks.push(DiffHunk {
                header,
                position: header_position,
                end_position: header_position,
                lines: Vec::new(),
            });
            continue;
        }

        let (Some(state), Some(hunk), Some(current)) = (open.as_mut(), hunks.last_mut(), position)
        else {
            if line.starts_with("diff ") {
                position = None;
            }
            continue;
        };

        // "\ No newline at end of file" belongs to the previous line but
        // still occupies a position.
        if line.starts_with('\\') {
            let next = current.saturating_add(1);
            position = Some(next);
            hunk.end_position = next;
            continue;
        }

        if state.exhausted() {
            open = None;
            if line.starts_with("diff ") {
                position = None;
            }
            continue;
        }

        let next = current.saturating_add(1);
        let diff_line = match line.as_bytes().first() {
            Some(b'+') => {
                let l = DiffLine {
                    kind: LineKind::Added,
                    old_line: None,
                    new_line: Some(state.new_line),
                    position: next,
                    text: line.to_string(),
                };
                state.new_line = state.new_line.saturating_add(1);
                state.new_remaining = state.new_remaining.saturating_sub(1);
                l
            }
            Some(b'-') => {
                let l = DiffLine {
                    kind: LineKind::Deleted,
                    old_line: Some(state.old_line),
                    new_line: None,
                    position: next,
                    text: line.to_string(),
                };
                state.old_line = state.old_line.saturating_add(1);
                state.old_remaining = state.old_remaining.saturating_sub(1);
                l
            }
            // Space prefix or empty line (some tools strip the trailing space)
            Some(b' ') | None => {
                let l = DiffLine {
                    kind: LineKind::Context,
                    old_line: Some(state.old_line),
                    new_line: Some(state.new_line),
                    position: next,
                    text: line.to_string(),
                };
                state.old_line = state.old_line.saturating_add(1);
                state.new_line = state.new_line.saturating_add(1);
                state.old_remaining = state.old_remaining.saturating_sub(1);
                state.new_remaining = state.new_remaining.saturating_sub(1);
                l
            }
            Some(_) => {
                open = None;
                if line.starts_with("diff ") {
                    position = None;
                }
                continue;
            }
        };

        position = Some(next);
        hunk.end_position = next;
        hunk.lines.push(diff_line);
    }

    Ok(hunks)
}

/// The last physical line of the last hunk, if any.
#[must_use]
pub fn last_diff_line(hunks: &[DiffHunk]) -> Option<&DiffLine> {
    hunks.last().and_then(|h| h.lines.last())
}
