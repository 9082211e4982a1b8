mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "octrack", about = "Feature-based motion tracking for OCT camera footage")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recording metadata
    Info(commands::info::InfoArgs),
    /// Print, save or check a tracking configuration
    Config(commands::config::ConfigArgs),
    /// Normalize a single image and save the result
    Preprocess(commands::preprocess::PreprocessArgs),
    /// Track every frame of a recording against a reference frame
    Track(commands::track::TrackArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Preprocess(args) => commands::preprocess::run(args),
        Commands::Track(args) => commands::track::run(args),
    }
}
