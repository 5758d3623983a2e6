use std::path::PathBuf;

use clap::Parser;

/// canstream: forward a CAN dashboard's server-sent events into its UI store.
#[derive(Parser, Debug)]
#[command(name = "canstream", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SSE endpoint override (e.g. http://127.0.0.1:8050/stream).
    #[arg(long)]
    pub url: Option<String>,

    /// Log level override (debug, info, warn, error, or a full directive).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write the CAN log as CSV on shutdown (file, or directory for a
    /// generated name).
    #[arg(long, value_name = "PATH")]
    pub export_csv: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
