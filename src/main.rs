//! Main entry point for the pivot-translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;

use pivot_translator::cli::commands::{self, Commands};
use pivot_translator::telemetry;

/// Pivot-aware translation orchestration tool
#[derive(Parser, Debug)]
#[command(name = "pivot-translator", version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();
    telemetry::init(if args.verbose { "debug" } else { "info" });

    match args.command {
        Some(Commands::Inspect { models_dir }) => commands::handle_inspect(models_dir)?,
        Some(Commands::Plan {
            from,
            to,
            models_dir,
        }) => commands::handle_plan(from, to, models_dir)?,
        None => {
            println!("Please specify a command. Use --help for more information.");
        }
    }

    Ok(())
}
