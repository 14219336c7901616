// Region/model allocation ranking
use super::fold::{group_fold, MeanAcc, MetricMeanAcc};
use super::Aggregator;
use shared::models::{AllocationRow, AllocationTables, EnrichedRecord};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Total ranking order of the allocation table: mean units sold descending,
/// then mean revenue per unit descending with undefined values after every
/// defined one, then region and model ascending so equal rows still order the
/// same way on every run.
pub fn allocation_order(a: &AllocationRow, b: &AllocationRow) -> Ordering {
    b.mean_units_sold
        .total_cmp(&a.mean_units_sold)
        .then_with(|| b.mean_revenue_per_unit.rank_cmp(&a.mean_revenue_per_unit))
        .then_with(|| a.region.cmp(&b.region))
        .then_with(|| a.model.cmp(&b.model))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllocationOptimizer;

impl AllocationOptimizer {
    pub fn new() -> Self {
        Self
    }

    // Mean units sold and mean revenue per unit per (region, model), ranked.
    pub fn allocation_table(&self, records: &[EnrichedRecord]) -> Vec<AllocationRow> {
        let mut rows = group_fold(
            records,
            |r| (r.record.region.as_str(), r.record.model.as_str()),
            |r| (r.record.units_sold as f64, r.revenue_per_unit),
            |(region, model), (units, efficiency): (MeanAcc, MetricMeanAcc)| {
                let mean_revenue_per_unit = efficiency.mean();
                AllocationRow {
                    region: region.to_string(),
                    model: model.to_string(),
                    record_count: units.count(),
                    mean_units_sold: units.mean(),
                    mean_revenue_per_unit,
                    undefined_records: efficiency.undefined_count(),
                    flagged: !mean_revenue_per_unit.is_defined(),
                }
            },
        );
        rows.sort_by(allocation_order);

        for row in rows.iter().filter(|r| r.flagged) {
            tracing::warn!(
                region = %row.region,
                model = %row.model,
                undefined_records = row.undefined_records,
                "Revenue per unit is undefined for this pair (zero units sold); flagged in allocation table"
            );
        }
        rows
    }

    // Best-ranked model per region, then ordered by revenue efficiency across
    // regions. Expects `table` in `allocation_order`.
    pub fn top_allocation(&self, table: &[AllocationRow]) -> Vec<AllocationRow> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut top: Vec<AllocationRow> = table
            .iter()
            .filter(|row| seen.insert(row.region.as_str()))
            .cloned()
            .collect();
        top.sort_by(|a, b| {
            b.mean_revenue_per_unit
                .rank_cmp(&a.mean_revenue_per_unit)
                .then_with(|| a.region.cmp(&b.region))
        });
        top
    }

    pub fn preview<'t>(&self, table: &'t [AllocationRow], rows: usize) -> &'t [AllocationRow] {
        &table[..rows.min(table.len())]
    }
}

impl Aggregator for AllocationOptimizer {
    type Output = AllocationTables;

    fn name(&self) -> &str {
        "allocation"
    }

    fn compute(&self, records: &[EnrichedRecord]) -> AllocationTables {
        let allocation_table = self.allocation_table(records);
        let top_allocation = self.top_allocation(&allocation_table);
        tracing::debug!(
            pairs = allocation_table.len(),
            regions = top_allocation.len(),
            "Allocation tables computed"
        );
        AllocationTables {
            allocation_table,
            top_allocation,
        }
    }
}
