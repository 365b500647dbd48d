use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cmd::Commands;

/// Milestone-driven tracker for scale and software installation projects.
/// Data lives under --dir, $PMT_DIR, or ~/.pmt.
#[derive(Parser)]
#[command(name = "pmt", version, about = "Installation project tracker")]
pub struct Cli {
    /// Data directory (store, outbox, templates, review cursor, pmt.toml).
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Acting user id or initials. Falls back to `default_actor` in pmt.toml.
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}
