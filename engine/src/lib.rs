// Engine library root
// This file declares the modules for the engine crate.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod report;

pub use analysis::AnalysisPipeline;
pub use config::EngineSettings;
pub use data::{EnrichedBatch, SalesCsvParser};
pub use error::EngineError;

#[cfg(test)]
mod tests {
    use super::*;

    // CSV text in, every table out, through the public API only.
    #[test]
    fn csv_to_report() {
        let csv_content = "\
Quarter,Region,iPhone Model,Units Sold,Currency,Revenue (Local),Revenue (USD),Exchange Rate
2023 Q4,EU,A,100,EUR,1000,1000,1.0
2023 Q4,EU,B,50,EUR,1000,1000,1.0";
        let records = SalesCsvParser::load_records_from_reader(csv_content.as_bytes(), b',').unwrap();
        let report = AnalysisPipeline::new().analyze(&records).unwrap();

        let ranked: Vec<&str> = report.allocation.allocation_table.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(ranked, vec!["A", "B"]);
        assert_eq!(report.allocation.top_allocation.len(), 1);
        assert_eq!(report.allocation.top_allocation[0].model, "A");
    }
}
