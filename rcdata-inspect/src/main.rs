//! rcdata inspector
//!
//! Usage:
//!   rcdata-inspect header settings.cresource
//!   rcdata-inspect dump settings.cresource --public-key <hex>

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rcdata_inspect::{dump, inspect_header};
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rcdata-inspect")]
#[command(about = "Inspect rcdata files")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the header bits and pipeline stages
    Header { path: PathBuf },
    /// Verify, decode, and print the stored fields
    Dump {
        path: PathBuf,

        /// Hex-encoded Ed25519 public key for signed files
        #[arg(long)]
        public_key: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!(?args, "Starting");
    let output = match args.command {
        Command::Header { path } => serde_json::to_string_pretty(&inspect_header(&path)?)?,
        Command::Dump { path, public_key } => {
            serde_json::to_string_pretty(&dump(&path, public_key.as_deref())?)?
        }
    };
    println!("{output}");
    Ok(())
}
