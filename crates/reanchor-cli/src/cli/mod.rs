//! CLI command definitions.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use reanchor_core::diff::DiffSide;

use crate::output::OutputFormat;

pub mod commands;

/// Map pull request review comments across diffs
#[derive(Parser, Debug)]
#[command(name = "reanchor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Repository root (default: $REANCHOR_REPO_ROOT, then the enclosing git repository)
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug); $REANCHOR_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map a line through a unified diff (old to new, or new to old with --reverse)
    MapLine {
        /// File holding the unified diff
        diff: PathBuf,
        /// 1-based line number
        line: u32,
        #[arg(long)]
        reverse: bool,
    },

    /// Translate a diff position into a line number
    Position {
        /// File holding the pull request diff of one file
        diff: PathBuf,
        position: u32,
        #[arg(long, value_enum, default_value_t = DiffSide::Head)]
        side: DiffSide,
    },

    /// Translate a line number into a diff position
    Line {
        /// File holding the pull request diff of one file
        diff: PathBuf,
        /// 1-based line number
        line: u32,
        #[arg(long, value_enum, default_value_t = DiffSide::Head)]
        side: DiffSide,
    },

    /// Re-anchor comments against the diff from their commit to the current content
    Anchor {
        /// JSON array of comments
        comments: PathBuf,
        /// File holding the diff from the comments' commit to now
        diff: PathBuf,
    },

    /// Group comments into threads
    Threads {
        /// JSON array of comments
        comments: PathBuf,
    },

    /// Thread delta between two comment lists
    Reconcile {
        /// JSON array of comments before
        old: PathBuf,
        /// JSON array of comments after
        new: PathBuf,
    },

    /// Place comments in the working copy of a file
    Worktree {
        /// Repository-relative path of the file
        path: String,
        /// Pull request head commit
        #[arg(long)]
        head: String,
        /// File holding the pull request diff of the file
        #[arg(long)]
        pr_diff: PathBuf,
        /// JSON array of comments
        #[arg(long)]
        comments: PathBuf,
    },
}
