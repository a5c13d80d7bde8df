//! Command implementations.

pub mod anchors;
pub mod helpers;
pub mod lines;
pub mod threads;

pub use anchors::{run_anchor, run_worktree};
pub use lines::{run_line, run_map_line, run_position};
pub use threads::{run_reconcile, run_threads};
