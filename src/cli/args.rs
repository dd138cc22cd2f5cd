//! @dose
//! purpose: This module defines the command-line interface for apistub using the clap derive
//!     macros. It specifies the render and check commands and their arguments.
//!
//! when-editing:
//!     - !Each command struct must derive Args and be added to the Commands enum
//!     - !Global flags (config, verbose) are defined on Cli and propagate to all subcommands
//!
//! invariants:
//!     - The Cli struct is the root parser that clap uses to parse command-line arguments
//!     - PathBuf is used for all file path arguments
//!
//! gotchas:
//!     - Without --output the review file goes to stdout, so logs must stay on stderr
//!     - -v can be repeated: -v info, -vv debug, -vvv trace; RUST_LOG overrides all of them

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apistub")]
#[command(author, version, about = "Render Python package snapshots into API review token trees")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to apistub.toml (defaults to the one next to the snapshot)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile and render a snapshot into a review file
    Render(RenderArgs),

    /// Reconcile a snapshot and report identity collisions without rendering
    Check(CheckArgs),
}

/// Output format of the render command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Review file JSON
    #[default]
    Json,
    /// Indented plain-text preview
    Text,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Package snapshot JSON produced by the collector
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Write output to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Package snapshot JSON produced by the collector
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}
