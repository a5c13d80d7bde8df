//! `reanchor map-line`, `position` and `line`.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use reanchor_core::diff::{
    absolute_to_position, parse_hunks, position_to_absolute, DiffSide, LineMap,
};

use super::helpers::read_input;
use crate::output::{Formatter, OutputFormat};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MappedLine {
    pub line: u32,
    pub from: DiffSide,
    /// `None` when the line has no counterpart.
    pub mapped: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PositionLine {
    pub position: Option<u32>,
    pub side: DiffSide,
    pub line: Option<u32>,
}

pub fn map_line(diff: &str, line: u32, reverse: bool) -> Result<MappedLine> {
    let map = LineMap::parse(diff)?;
    let from = if reverse { DiffSide::Head } else { DiffSide::Base };
    Ok(MappedLine {
        line,
        from,
        mapped: map.map(line, from),
    })
}

pub fn position_line(diff: &str, position: u32, side: DiffSide) -> Result<PositionLine> {
    let hunks = parse_hunks(diff)?;
    Ok(PositionLine {
        position: Some(position),
        side,
        line: position_to_absolute(&hunks, position, side),
    })
}

pub fn line_position(diff: &str, line: u32, side: DiffSide) -> Result<PositionLine> {
    let hunks = parse_hunks(diff)?;
    Ok(PositionLine {
        position: absolute_to_position(&hunks, line, side, None),
        side,
        line: Some(line),
    })
}

pub fn run_map_line(diff: &Path, line: u32, reverse: bool, format: OutputFormat) -> Result<()> {
    let result = map_line(&read_input(diff)?, line, reverse)?;
    Formatter::new(format).print(&result)
}

pub fn run_position(
    diff: &Path,
    position: u32,
    side: DiffSide,
    format: OutputFormat,
) -> Result<()> {
    let result = position_line(&read_input(diff)?, position, side)?;
    Formatter::new(format).print(&result)
}

pub fn run_line(diff: &Path, line: u32, side: DiffSide, format: OutputFormat) -> Result<()> {
    let result = line_position(&read_input(diff)?, line, side)?;
    Formatter::new(format).print(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PATCH: &str = "@@ -1,3 +1,4 @@\n one\n+two\n three\n four\n@@ -10,2 +11,2 @@\n ten\n-eleven\n+ELEVEN\n";

    #[test]
    fn test_map_line_both_directions() {
        assert_eq!(map_line(PATCH, 3, false).unwrap().mapped, Some(4));
        assert_eq!(map_line(PATCH, 2, true).unwrap().mapped, None);
        assert_eq!(map_line(PATCH, 20, true).unwrap().mapped, Some(19));
    }

    #[test]
    fn test_position_and_line_agree() {
        let at = position_line(PATCH, 2, DiffSide::Head).unwrap();
        assert_eq!(at.line, Some(2));
        let back = line_position(PATCH, 2, DiffSide::Head).unwrap();
        assert_eq!(back.position, Some(2));
    }

    #[test]
    fn test_header_position_has_no_line() {
        assert_eq!(position_line(PATCH, 5, DiffSide::Base).unwrap().line, None);
    }

    #[test]
    fn test_invalid_header_is_an_error() {
        assert!(map_line("@@ nope @@\n", 1, false).is_err());
    }
}
