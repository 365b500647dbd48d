//! # pmt - Installation Project Tracker
//!
//! A command-line tracker for scale, hardware and software installation
//! projects. Progress is measured in milestone checkpoints (20, 40, 60, 80, 90
//! and 100 percent) and new projects are seeded from a library of task
//! templates chosen by project type.
//!
//! ## Key Features
//!
//! - **Milestone Progress**: a project reaches a checkpoint only once every task
//!   at that checkpoint and every earlier one is closed out
//! - **Template Instantiation**: tasks and subtasks generated per project type,
//!   with assignees resolved against the project owner
//! - **Review Cycles**: change summaries since the last review, with progress
//!   snapshots taken when a cycle is closed
//! - **Write-behind Persistence**: every change lands in memory first and is
//!   delivered to the record store through a retrying outbox
//!
//! ## Quick Start
//!
//! ```bash
//! pmt --actor kh new "Valley Feed Mill" --customer "Valley Feed" \
//!     --work-order WO-1002 --type hardware-only --quote pm-time=6
//! pmt projects
//! pmt task status "Valley Feed Mill" "Initial customer kickoff call" done
//! pmt review
//! ```
//!
//! Data is stored in `~/.pmt/` (or `--dir` / `$PMT_DIR`): `store/` holds one
//! JSON file per record type, alongside `outbox.json`, `templates.json`,
//! `phases.json`, `review.json` and an optional `pmt.toml`.

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod instantiate;
pub mod outbox;
pub mod phase;
pub mod progress;
pub mod project;
pub mod records;
pub mod reference;
pub mod repo;
pub mod review;
pub mod session;
pub mod stats;
pub mod task;
pub mod template;

use cli::Cli;
use cmd::*;
use config::DataPaths;
use session::Session;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Open a session, run one command and close it. The session is closed even
/// when the command fails so writes queued before the failure are kept.
fn run(cli: Cli) -> error::Result<()> {
    let mut session = Session::open(DataPaths::resolve(cli.dir), cli.actor)?;
    let outcome = dispatch(&mut session, cli.command);
    let closed = session.close();
    outcome?;
    closed?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Completions need no data directory.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
