use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod summary;

use commands::config::{handle_inspect_config, ConfigArgs};
use commands::run::{handle_run, RunArgs, RunMode};

#[derive(Parser, Debug)]
#[command(author, version, about = "Clean and condense NOAA LCD station observations", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clean station files into one date-keyed table (one row per station-day)
    Clean(RunArgs),
    /// Clean station files and condense them to one row per date
    Condense(RunArgs),
    /// Print the effective pipeline configuration as TOML
    InspectConfig(ConfigArgs),
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Command::Clean(args) => handle_run(RunMode::Clean, &args),
        Command::Condense(args) => handle_run(RunMode::Condense, &args),
        Command::InspectConfig(args) => handle_inspect_config(&args),
    }
}
