mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "psii", about = "Chlorophyll fluorescence phenotyping of plant trays")]
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
    /// List the sessions and measurements of a manifest
    Info(commands::info::InfoArgs),
    /// Segment plants in a single image
    Segment(commands::segment::SegmentArgs),
    /// Print or save the default pipeline config
    Config(commands::config::ConfigArgs),
    /// Run the full processing pipeline
    Run(commands::pipeline::RunArgs),
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
        Commands::Segment(args) => commands::segment::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Run(args) => commands::pipeline::run(args),
    }
}
