// JSON export of the full report, for whatever renders the charts.
use crate::error::EngineError;
use shared::models::AnalysisReport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_report_json(path: &Path, report: &AnalysisReport) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to create report export file");
        EngineError::from(e)
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| EngineError::ProcessingError(format!("Failed to serialize report: {}", e)))?;
    writer.flush()?;
    tracing::info!("Wrote analysis report to '{}'", path.display());
    Ok(())
}
