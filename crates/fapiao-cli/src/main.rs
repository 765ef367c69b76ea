//! CLI for the Chinese VAT invoice archive.

mod commands;
mod ocr_client;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{bin, ingest, list, search, stats, update};

/// Invoice archive - OCR, deduplicate and manage scanned VAT invoices
#[derive(Parser)]
#[command(name = "fapiao")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload and archive an invoice PDF
    Ingest(ingest::IngestArgs),

    /// List archived invoices
    List(list::ListArgs),

    /// Search archived invoices
    Search(search::SearchArgs),

    /// Edit fields of archived invoices
    Update(update::UpdateArgs),

    /// Manage the recycle bin
    Bin(bin::BinArgs),

    /// Show archive statistics
    Stats(stats::StatsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Ingest(args) => ingest::run(args, cli.config.as_deref()),
        Commands::List(args) => list::run(args, cli.config.as_deref()),
        Commands::Search(args) => search::run(args, cli.config.as_deref()),
        Commands::Update(args) => update::run(args, cli.config.as_deref()),
        Commands::Bin(args) => bin::run(args, cli.config.as_deref()),
        Commands::Stats(args) => stats::run(args, cli.config.as_deref()),
    }
}
