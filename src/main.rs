//! Selenese runner - runs YAML browser test scripts
//!
//! Runs test cases and suites against a browser driver and optionally
//! writes JUnit XML reports for CI systems.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use selenese::common::logging;
use selenese::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "selenese", about = "Run YAML browser test scripts")]
#[command(version, long_about = None)]
struct Cli {
    /// Log every command at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    logging::init_cli(cli.verbose);

    match cli::dispatch(cli.command, cli.config.as_deref()) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(4)
        }
    }
}
