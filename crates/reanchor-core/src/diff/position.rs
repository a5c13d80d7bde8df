//! Translation between diff positions and absolute line numbers.

use serde::Serialize;

use super::{DiffHunk, DiffLine, DiffSide, LineMap};

/// Inclusive, 1-based range of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

/// Find the diff line at `position`, if one exists.
///
/// Hunk header positions hold no line and return `None`.
#[must_use]
pub fn diff_line_at(hunks: &[DiffHunk], position: u32) -> Option<&DiffLine> {
    hunks.iter().find_map(|h| h.line_at(position))
}

/// Absolute line number on `side` for the line at `position`.
///
/// `None` when the position is a header or out of range, or when the line
/// does not exist on `side` (an addition viewed on the base side, a deletion
/// on the head side).
#[must_use]
pub fn position_to_absolute(hunks: &[DiffHunk], position: u32, side: DiffSide) -> Option<u32> {
    diff_line_at(hunks, position)?.line_on(side)
}

/// Diff position for an absolute line on `side`.
///
/// When `content_diff` is given, `line` is first mapped from the new side of
/// that diff to its old side (e.g. from the working copy back to the head
/// commit). Lines inside a hunk resolve exactly. Lines after the last hunk
/// get a pseudo-position counted from that hunk's last position. Lines before
/// the first hunk or between two hunks have no position: every position
/// between two hunks is already taken by the second hunk's header and lines.
#[must_use]
pub fn absolute_to_position(
    hunks: &[DiffHunk],
    line: u32,
    side: DiffSide,
    content_diff: Option<&LineMap>,
) -> Option<u32> {
    let line = match content_diff {
        Some(map) => map.map_new_to_old(line)?,
        None => line,
    };
    if line == 0 {
        return None;
    }

    for hunk in hunks {
        if line < hunk.header.first_line(side) {
            return None;
        }
        if hunk.header.contains(side, line) {
            return hunk.line_numbered(side, line).map(|l| l.position);
        }
    }

    trailing_position(hunks.last()?, line, side)
}

/// Pseudo-position of a line after `last`, counted from its last position.
fn trailing_position(last: &DiffHunk, line: u32, side: DiffSide) -> Option<u32> {
    let offset = line.checked_sub(last.header.last_line(side))?;
    last.end_position.checked_add(offset)
}

/// Line ranges on `side` covered by each hunk, for hunks that have lines there.
#[must_use]
pub fn commenting_ranges(hunks: &[DiffHunk], side: DiffSide) -> Vec<LineRange> {
    hunks
        .iter()
        .filter(|h| h.header.range(side).1 > 0)
        .map(|h| LineRange {
            start: h.header.first_line(side),
            end: h.header.last_line(side),
        })
        .collect()
}
