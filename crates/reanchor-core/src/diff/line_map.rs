//! Line mapping across a diff.
//!
//! Given the diff between two versions of a file, translates a line number
//! from one version to the other. Lines outside every hunk move by the
//! accumulated size change of the hunks above them; lines inside a hunk are
//! walked line by line. A line that only exists on the source side has no
//! counterpart and maps to `None`.

use super::{parse_hunks, DiffError, DiffHunk, DiffSide};

/// Parsed diff ready for repeated line lookups in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMap {
    hunks: Vec<DiffHunk>,
}

impl LineMap {
    /// Parse a unified diff. An empty diff is the identity map.
    pub fn parse(diff: &str) -> Result<Self, DiffError> {
        Ok(Self {
            hunks: parse_hunks(diff)?,
        })
    }

    #[must_use]
    pub const fn from_hunks(hunks: Vec<DiffHunk>) -> Self {
        Self { hunks }
    }

    /// Whether the diff changes nothing.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.hunks.is_empty()
    }

    #[must_use]
    pub fn hunks(&self) -> &[DiffHunk] {
        &self.hunks
    }

    /// Map a line of the old file to the new file.
    #[must_use]
    pub fn map_old_to_new(&self, line: u32) -> Option<u32> {
        self.map(line, DiffSide::Base)
    }

    /// Map a line of the new file back to the old file.
    #[must_use]
    pub fn map_new_to_old(&self, line: u32) -> Option<u32> {
        self.map(line, DiffSide::Head)
    }

    /// Map `line` from side `from` to the opposite side.
    #[must_use]
    pub fn map(&self, line: u32, from: DiffSide) -> Option<u32> {
        if line == 0 {
            return None;
        }

        let to = from.opposite();
        let mut offset: i64 = 0;

        for hunk in &self.hunks {
            let header = &hunk.header;
            if line < header.first_line(from) {
                break;
            }
            if header.contains(from, line) {
                return walk_hunk(hunk, line, from);
            }
            let (_, from_count) = header.range(from);
            let (_, to_count) = header.range(to);
            offset += i64::from(to_count) - i64::from(from_count);
        }

        shift(line, offset)
    }
}

/// Find `line` inside a hunk and return its counterpart on the other side.
fn walk_hunk(hunk: &DiffHunk, line: u32, from: DiffSide) -> Option<u32> {
    hunk.line_numbered(from, line)?.line_on(from.opposite())
}

fn shift(line: u32, offset: i64) -> Option<u32> {
    u32::try_from(i64::from(line) + offset).ok().filter(|l| *l > 0)
}

/// Map a line of the old file to the new file through `diff`.
pub fn map_old_to_new(diff: &str, line: u32) -> Result<Option<u32>, DiffError> {
    Ok(LineMap::parse(diff)?.map_old_to_new(line))
}

/// Map a line of the new file back to the old file through `diff`.
pub fn map_new_to_old(diff: &str, line: u32) -> Result<Option<u32>, DiffError> {
    Ok(LineMap::parse(diff)?.map_new_to_old(line))
}
