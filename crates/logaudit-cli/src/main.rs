mod cli;
mod commands;
mod types;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::types::{Verdict, EXIT_INPUT_ERROR, EXIT_VIOLATION};

fn run(cli: Cli) -> miette::Result<Verdict> {
    match cli.command {
        Commands::Broadcast {
            path,
            nb_proc,
            nb_msg,
            fifo,
            collect_all,
            format,
        } => commands::audit::run_broadcast_command(
            &path,
            nb_proc,
            nb_msg,
            fifo,
            collect_all,
            &format,
        ),
        Commands::Lattice {
            path,
            round_policy,
            cross_process,
            collect_all,
            format,
        } => commands::audit::run_lattice_command(
            &path,
            &round_policy,
            cross_process,
            collect_all,
            &format,
        ),
        Commands::Suite {
            manifest,
            format,
            out,
        } => commands::suite::run_suite_command(&manifest, &format, out.as_deref()),
    }
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(Verdict::Pass) => {}
        Ok(Verdict::Fail) => std::process::exit(EXIT_VIOLATION),
        Err(report) => {
            eprintln!("{report:?}");
            std::process::exit(EXIT_INPUT_ERROR);
        }
    }
}
