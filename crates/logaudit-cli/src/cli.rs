//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Offline safety auditor for the logs of broadcast and lattice agreement runs.\n\n\
    Broadcast runs:\n  \
    logaudit broadcast --path runs/urb --nb-proc 3 --nb-msg 100\n\n\
    Lattice agreement runs (paired <stem>.output / <stem>.config files):\n  \
    logaudit lattice --path runs/la\n\n\
    Exit status: 0 when the run is safe, 1 on a safety violation, 2 on unreadable input.";

#[derive(Parser)]
#[command(name = "logaudit")]
#[command(about = "Offline safety auditor for broadcast and lattice agreement logs")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Check that every process delivered every broadcast message exactly once
    #[command(display_order = 10)]
    Broadcast {
        /// Directory containing the per-process .output files
        #[arg(long)]
        path: PathBuf,

        /// Number of processes in the run
        #[arg(long = "nb-proc", value_parser = clap::value_parser!(u64).range(1..))]
        nb_proc: u64,

        /// Number of messages each process broadcast
        #[arg(long = "nb-msg")]
        nb_msg: u64,

        /// Also require each sender's messages to be delivered in order (FIFO)
        #[arg(long, default_value_t = false)]
        fifo: bool,

        /// Report every violation instead of stopping at the first one
        #[arg(long, default_value_t = false)]
        collect_all: bool,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check validity and round count of a lattice agreement run
    #[command(display_order = 20)]
    Lattice {
        /// Directory containing paired .output and .config files
        #[arg(long)]
        path: PathBuf,

        /// Round pairing policy: truncate | strict
        #[arg(long, default_value = "truncate")]
        round_policy: String,

        /// Also require comparable decisions across processes
        #[arg(long, default_value_t = false)]
        cross_process: bool,

        /// Report every violation instead of stopping at the first one
        #[arg(long, default_value_t = false)]
        collect_all: bool,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Audit every run listed in a suite manifest and compare with expected verdicts
    #[command(display_order = 30)]
    Suite {
        /// Path to the suite manifest JSON
        manifest: PathBuf,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,

        /// Also write the JSON suite report to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
