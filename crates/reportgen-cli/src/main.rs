//! # reportgen
//!
//! Converts XML test reports into html reports whose step data is split into
//! chunks and loaded on demand, and inspects reports produced that way.

mod display;
mod generate;
mod inspect;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reportgen_core::ReportConfig;
use tracing_subscriber::EnvFilter;

/// Output format for inspection commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for programmatic access
    Json,
}

/// reportgen - chunked, lazily loaded html test reports
#[derive(Parser, Debug)]
#[command(name = "reportgen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "reportgen.yml", global = true)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert an XML report into an html report with chunked step data
    Generate(generate::GenerateArgs),

    /// Print verdict statistics of an XML report
    Summary(inspect::SummaryArgs),

    /// List the items of a generated report
    Items(inspect::ItemsArgs),

    /// Print one page of an item's steps from a generated report
    Steps(inspect::StepsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays parseable
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ReportConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Commands::Generate(args) => generate::execute(args, &config),
        Commands::Summary(args) => inspect::summary(args),
        Commands::Items(args) => inspect::items(args),
        Commands::Steps(args) => inspect::steps(args, &config).await,
    }
}
