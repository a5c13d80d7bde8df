//! reanchor - map pull request review comments across diffs

mod cli;
mod output;

use std::env;
use std::io;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::commands::{
    run_anchor, run_line, run_map_line, run_position, run_reconcile, run_threads, run_worktree,
};
use cli::{Cli, Commands};
use reanchor_core::config::resolve_repo_root;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "REANCHOR_LOG";

fn init_tracing(verbose: u8, json: bool) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let cwd = env::current_dir()?;
    let root = resolve_repo_root(cli.repo.as_deref(), &cwd);
    let format = cli.format;

    match cli.command {
        Commands::MapLine {
            diff,
            line,
            reverse,
        } => run_map_line(&diff, line, reverse, format)?,
        Commands::Position {
            diff,
            position,
            side,
        } => run_position(&diff, position, side, format)?,
        Commands::Line { diff, line, side } => run_line(&diff, line, side, format)?,
        Commands::Anchor { comments, diff } => run_anchor(&comments, &diff, format)?,
        Commands::Threads { comments } => run_threads(&root, &comments, format)?,
        Commands::Reconcile { old, new } => run_reconcile(&root, &old, &new, format)?,
        Commands::Worktree {
            path,
            head,
            pr_diff,
            comments,
        } => run_worktree(root, &path, &head, &pr_diff, &comments, format)?,
    }

    Ok(())
}
