// Analysis components: period resolution, the grouped-fold primitive and the
// three aggregators run over the enriched batch.
pub mod allocation;
pub mod currency;
pub mod fold;
pub mod period;
pub mod pipeline;
pub mod trend;

pub use allocation::AllocationOptimizer;
pub use currency::CurrencyAnalyzer;
pub use period::{resolve_period, ResolvedPeriod};
pub use pipeline::AnalysisPipeline;
pub use trend::{TrendAggregator, TrendDimension};

use shared::models::EnrichedRecord;

// Common trait for all aggregating components. Each one only reads the shared
// batch and builds its own output, so they can run in any order or in parallel.
pub trait Aggregator: Send + Sync {
    type Output: Send + 'static;

    fn name(&self) -> &str;
    fn compute(&self, records: &[EnrichedRecord]) -> Self::Output;
}
