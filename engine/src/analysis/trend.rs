// Unit-sales trends over time, by region and by product model
use super::fold::{group_fold, SumAcc};
use super::Aggregator;
use shared::models::{EnrichedRecord, SalesRecord, TrendPoint, TrendTables};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDimension {
    Region,
    Model,
}

impl TrendDimension {
    fn label(self, record: &SalesRecord) -> &str {
        match self {
            TrendDimension::Region => &record.region,
            TrendDimension::Model => &record.model,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TrendAggregator;

impl TrendAggregator {
    pub fn new() -> Self {
        Self
    }

    // One row per (date, label) pair present in the input, ordered by date then
    // label. Absent combinations are not zero-filled.
    pub fn units_by(&self, records: &[EnrichedRecord], dimension: TrendDimension) -> Vec<TrendPoint> {
        group_fold(
            records,
            |r| (r.date, dimension.label(&r.record)),
            |r| r.record.units_sold,
            |(date, group), acc: SumAcc| TrendPoint {
                date,
                group: group.to_string(),
                units_sold: acc.total,
            },
        )
    }

    pub fn region_trend(&self, records: &[EnrichedRecord]) -> Vec<TrendPoint> {
        self.units_by(records, TrendDimension::Region)
    }

    pub fn model_trend(&self, records: &[EnrichedRecord]) -> Vec<TrendPoint> {
        self.units_by(records, TrendDimension::Model)
    }
}

impl Aggregator for TrendAggregator {
    type Output = TrendTables;

    fn name(&self) -> &str {
        "trend"
    }

    fn compute(&self, records: &[EnrichedRecord]) -> TrendTables {
        let tables = TrendTables {
            region_trend: self.region_trend(records),
            model_trend: self.model_trend(records),
        };
        tracing::debug!(
            region_rows = tables.region_trend.len(),
            model_rows = tables.model_trend.len(),
            "Trend tables computed"
        );
        tables
    }
}
