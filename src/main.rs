//! @dose
//! purpose: This is the CLI entry point for apistub. It parses command-line arguments using
//!     clap, installs the tracing subscriber and dispatches to the render or check command.
//!
//! when-editing:
//!     - !All command handlers are imported from the apistub crate
//!     - !Logs go to stderr; stdout is reserved for the review file
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - One and only one subcommand is always executed per invocation
//!     - The process exits with 0 on success, 1 on any error
//!
//! do-not:
//!     - Never add business logic here - delegate to command modules
//!
//! gotchas:
//!     - RUST_LOG wins over -v when both are set

use apistub::cli::{Cli, Commands};
use apistub::commands::{run_check, run_render};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Render(args) => run_render(args, cli.config.as_deref()),
        Commands::Check(args) => run_check(args),
    }
}
