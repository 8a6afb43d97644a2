//! Generals CLI - Command-line interface
//!
//! Commands:
//! - create: Write a fresh evaluator and its metadata
//! - info: Show a saved evaluator
//! - selfplay: Generate MCTS self-play training data

mod network_cmd;
mod selfplay_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use network_cmd::{CreateArgs, InfoArgs};
use selfplay_cmd::SelfPlayArgs;

#[derive(Parser)]
#[command(name = "generals")]
#[command(about = "Self-play engine for a generals.io-style strategy game")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding evaluators and generated data
    #[arg(long, global = true, default_value = "data", value_name = "DIR")]
    data_dir: PathBuf,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh evaluator
    Create(CreateArgs),
    /// Show evaluator metadata
    Info(InfoArgs),
    /// Run self-play and write training samples
    Selfplay(SelfPlayArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Create(args) => network_cmd::create(args, &cli.data_dir),
        Commands::Info(args) => network_cmd::info(args, &cli.data_dir),
        Commands::Selfplay(args) => selfplay_cmd::run(args, &cli.data_dir),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
