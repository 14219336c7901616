// Command-line arguments for the `engine` binary
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "engine", version, about = "Sales trend, currency and allocation analysis over a sales CSV")]
pub struct Cli {
    /// Sales CSV with Quarter, Region, iPhone Model, Units Sold, Currency,
    /// Revenue (Local), Revenue (USD) and Exchange Rate columns.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Optional JSON settings file.
    #[arg(short, long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Write the full report (every table) as JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Rows of the ranked allocation table to print.
    #[arg(long)]
    pub top: Option<usize>,

    /// Run the analysis components one after another instead of as parallel tasks.
    #[arg(long)]
    pub sequential: bool,
}
