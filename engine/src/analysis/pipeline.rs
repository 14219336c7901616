// Pipeline runner: enrich once, then run every aggregator over the same batch
use super::{Aggregator, AllocationOptimizer, CurrencyAnalyzer, TrendAggregator};
use crate::data::batch::EnrichedBatch;
use crate::error::EngineError;
use shared::models::{AnalysisReport, EnrichedRecord, SalesRecord};
use std::sync::Arc;

#[derive(Debug, Default, Clone, Copy)]
pub struct AnalysisPipeline {
    trend: TrendAggregator,
    currency: CurrencyAnalyzer,
    allocation: AllocationOptimizer,
}

impl AnalysisPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, records: &[SalesRecord]) -> Result<AnalysisReport, EngineError> {
        let batch = EnrichedBatch::enrich(records)?;
        Ok(self.run(&batch))
    }

    pub async fn analyze_parallel(&self, records: &[SalesRecord]) -> Result<AnalysisReport, EngineError> {
        let batch = EnrichedBatch::enrich(records)?;
        self.run_parallel(&batch).await
    }

    // Single task, components one after another.
    pub fn run(&self, batch: &EnrichedBatch) -> AnalysisReport {
        let records = batch.records();
        let report = AnalysisReport {
            summary: batch.summary(),
            trends: self.trend.compute(records),
            currency: self.currency.compute(records),
            allocation: self.allocation.compute(records),
        };
        log_report(&report);
        report
    }

    // One blocking task per component. Enrichment is already complete, so the
    // tasks only share the read-only batch and need no locking.
    pub async fn run_parallel(&self, batch: &EnrichedBatch) -> Result<AnalysisReport, EngineError> {
        let (trends, currency, allocation) = tokio::try_join!(
            spawn_component(self.trend, batch.shared()),
            spawn_component(self.currency, batch.shared()),
            spawn_component(self.allocation, batch.shared()),
        )?;
        let report = AnalysisReport {
            summary: batch.summary(),
            trends,
            currency,
            allocation,
        };
        log_report(&report);
        Ok(report)
    }
}

async fn spawn_component<A>(component: A, records: Arc<[EnrichedRecord]>) -> Result<A::Output, EngineError>
where
    A: Aggregator + 'static,
{
    let name = component.name().to_string();
    tracing::debug!(component = %name, records = records.len(), "Spawning analysis task");
    tokio::task::spawn_blocking(move || component.compute(&records))
        .await
        .map_err(|e| {
            tracing::error!(component = %name, error = %e, "Analysis task failed");
            EngineError::ProcessingError(format!("{} analysis task failed: {}", name, e))
        })
}

fn log_report(report: &AnalysisReport) {
    tracing::info!(
        records = report.summary.records,
        region_trend = report.trends.region_trend.len(),
        model_trend = report.trends.model_trend.len(),
        exchange_rate_trend = report.currency.exchange_rate_trend.len(),
        allocation_pairs = report.allocation.allocation_table.len(),
        top_allocation = report.allocation.top_allocation.len(),
        "Analysis tables produced"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::record;
    use shared::models::Metric;

    fn sample() -> Vec<SalesRecord> {
        vec![
            record("2023 Q3", "EU", "iPhone 15", 120, "EUR", 1000.0, 1100.0, 1.08),
            record("2023 Q4", "EU", "iPhone 15", 180, "EUR", 1500.0, 1650.0, 1.1),
            record("2023 Q4", "EU", "iPhone 14", 90, "EUR", 700.0, 770.0, 1.1),
            record("2023 Q3", "US", "iPhone 14", 200, "USD", 1600.0, 1600.0, 1.0),
            record("2023 Q4", "US", "iPhone 15", 150, "USD", 1500.0, 1500.0, 1.0),
            record("2023 Q4", "Asia", "iPhone 14", 0, "INR", 0.0, 0.0, 0.012),
        ]
    }

    #[test]
    fn test_analyze_produces_every_table() {
        let report = AnalysisPipeline::new().analyze(&sample()).unwrap();
        assert_eq!(report.summary.records, 6);
        assert_eq!(report.trends.region_trend.len(), 5);
        assert_eq!(report.trends.model_trend.len(), 4);
        assert_eq!(report.currency.exchange_rate_trend.len(), 5);
        assert_eq!(report.currency.revenue_diff_by_currency.len(), 3);
        assert_eq!(report.currency.revenue_diff_by_date_currency.len(), 5);
        assert_eq!(report.currency.total_usd_by_currency.len(), 3);
        assert_eq!(report.allocation.allocation_table.len(), 5);
        assert_eq!(report.allocation.top_allocation.len(), 3);

        let last = report.allocation.top_allocation.last().unwrap();
        assert_eq!(last.region, "Asia");
        assert_eq!(last.mean_revenue_per_unit, Metric::Undefined);
    }

    #[test]
    fn test_analyze_is_reproducible() {
        let pipeline = AnalysisPipeline::new();
        let a = pipeline.analyze(&sample()).unwrap();
        let b = pipeline.analyze(&sample()).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_analyze_fails_fast_on_bad_period() {
        let mut records = sample();
        records[4].period = "sometime".to_string();
        let err = AnalysisPipeline::new().analyze(&records).unwrap_err();
        assert!(matches!(err, EngineError::InputFormat { row: 5, .. }));
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let pipeline = AnalysisPipeline::new();
        let batch = EnrichedBatch::enrich(&sample()).unwrap();
        let sequential = pipeline.run(&batch);
        let parallel = pipeline.run_parallel(&batch).await.unwrap();
        assert_eq!(sequential, parallel);
    }

    #[tokio::test]
    async fn test_analyze_parallel_propagates_errors() {
        let mut records = sample();
        records[0].region = String::new();
        let err = AnalysisPipeline::new().analyze_parallel(&records).await.unwrap_err();
        assert!(matches!(err, EngineError::IncompleteRecord { row: 1, .. }));
    }
}
