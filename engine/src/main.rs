// Engine main entry point
use anyhow::Context;
use clap::Parser;
use engine::cli::Cli;
use engine::report::{format_report, write_report_json};
use engine::{AnalysisPipeline, EngineSettings, EnrichedBatch, SalesCsvParser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Settings come first so their log filter can seed the subscriber;
    // RUST_LOG still wins when set.
    let mut settings = EngineSettings::load(cli.config.as_deref()).context("Failed to load engine settings")?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(top) = cli.top {
        settings.allocation_preview_rows = top;
    }
    if cli.sequential {
        settings.parallel = false;
    }

    info!("Starting sales analysis engine...");
    if let Err(e) = run(&cli, &settings).await {
        error!("Analysis failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(cli: &Cli, settings: &EngineSettings) -> anyhow::Result<()> {
    let records = SalesCsvParser::load_records_from_csv(&cli.input, settings.delimiter_byte()?)
        .with_context(|| format!("Failed to load sales records from '{}'", cli.input.display()))?;

    // Enrichment is the barrier: every record has a date before any table is built.
    let batch = EnrichedBatch::enrich(&records).context("Failed to enrich sales records")?;
    if batch.is_empty() {
        tracing::warn!("Input has no data rows; every table will be empty");
    }

    let pipeline = AnalysisPipeline::new();
    let report = if settings.parallel {
        pipeline.run_parallel(&batch).await?
    } else {
        pipeline.run(&batch)
    };

    println!(
        "{}",
        format_report(&report, batch.preview(settings.dataset_preview_rows), settings.allocation_preview_rows)
    );

    if let Some(path) = &cli.export {
        write_report_json(path, &report)?;
    }
    Ok(())
}
