// The enriched, immutable record set every analysis component reads from
use crate::analysis::period::resolve_period;
use crate::error::EngineError;
use chrono::NaiveDate;
use shared::models::{BatchSummary, EnrichedRecord, Metric, SalesRecord};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    // Shared so worker tasks can hold the batch without copying it.
    records: Arc<[EnrichedRecord]>,
}

impl EnrichedBatch {
    // Validates and enriches every record, failing on the first bad one. Nothing
    // is skipped: a dropped row would silently change every date-keyed table.
    pub fn enrich(records: &[SalesRecord]) -> Result<Self, EngineError> {
        let enriched = records
            .iter()
            .enumerate()
            .map(|(idx, record)| enrich_record(record, idx + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let undefined = enriched.iter().filter(|r| !r.revenue_per_unit.is_defined()).count();
        if undefined > 0 {
            tracing::warn!("{} record(s) sold zero units; their revenue per unit is undefined", undefined);
        }
        tracing::info!("Enriched {} sales records", enriched.len());

        Ok(EnrichedBatch {
            records: enriched.into(),
        })
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn shared(&self) -> Arc<[EnrichedRecord]> {
        Arc::clone(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn regions(&self) -> Vec<String> {
        self.distinct(|r| &r.record.region)
    }

    pub fn models(&self) -> Vec<String> {
        self.distinct(|r| &r.record.model)
    }

    pub fn currencies(&self) -> Vec<String> {
        self.distinct(|r| &r.record.currency)
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }

    pub fn total_units(&self) -> u128 {
        self.records.iter().map(|r| u128::from(r.record.units_sold)).sum()
    }

    // First `rows` records in input order.
    pub fn preview(&self, rows: usize) -> &[EnrichedRecord] {
        &self.records[..rows.min(self.records.len())]
    }

    pub fn summary(&self) -> BatchSummary {
        let range = self.date_range();
        BatchSummary {
            records: self.len(),
            regions: self.regions(),
            models: self.models(),
            currencies: self.currencies(),
            first_date: range.map(|(first, _)| first),
            last_date: range.map(|(_, last)| last),
            total_units: self.total_units(),
        }
    }

    fn distinct(&self, field: impl Fn(&EnrichedRecord) -> &String) -> Vec<String> {
        self.records
            .iter()
            .map(field)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }
}

pub fn enrich_record(record: &SalesRecord, row: usize) -> Result<EnrichedRecord, EngineError> {
    validate_record(record, row)?;
    let period = resolve_period(&record.period).map_err(|e| e.at_row(row))?;

    Ok(EnrichedRecord {
        record: record.clone(),
        year: period.year,
        quarter: period.quarter,
        date: period.date,
        revenue_diff: record.revenue_usd - record.revenue_local * record.exchange_rate,
        revenue_per_unit: Metric::ratio(record.revenue_usd, record.units_sold as f64),
    })
}

// Records built outside the CSV parser get the same checks: no blank grouping
// key and no non-finite numeric field.
pub fn validate_record(record: &SalesRecord, row: usize) -> Result<(), EngineError> {
    let keys = [
        ("period", &record.period),
        ("region", &record.region),
        ("model", &record.model),
        ("currency", &record.currency),
    ];
    for (field, value) in keys {
        if value.trim().is_empty() {
            return Err(EngineError::IncompleteRecord {
                row,
                field: field.to_string(),
            });
        }
    }

    let numbers = [
        ("revenue_local", record.revenue_local),
        ("revenue_usd", record.revenue_usd),
        ("exchange_rate", record.exchange_rate),
    ];
    for (field, value) in numbers {
        if !value.is_finite() {
            return Err(EngineError::IncompleteRecord {
                row,
                field: field.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::record;
    use shared::models::Quarter;

    fn sample() -> Vec<SalesRecord> {
        vec![
            record("2023 Q4", "US", "iPhone 15", 100, "USD", 1000.0, 1000.0, 1.0),
            record("2023 Q2", "EU", "iPhone 14", 0, "EUR", 500.0, 540.0, 1.1),
            record("2024 Q1", "EU", "iPhone 15", 30, "EUR", 300.0, 330.0, 1.1),
        ]
    }

    #[test]
    fn test_enrich_derives_fields() {
        let batch = EnrichedBatch::enrich(&sample()).unwrap();
        let first = &batch.records()[0];
        assert_eq!(first.year, 2023);
        assert_eq!(first.quarter, Quarter::Q4);
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 10, 1).unwrap());
        assert_eq!(first.revenue_diff, 0.0);
        assert_eq!(first.revenue_per_unit, Metric::Defined(10.0));
        assert_eq!(first.record, sample()[0]);
    }

    #[test]
    fn test_zero_units_gives_undefined_metric() {
        let batch = EnrichedBatch::enrich(&sample()).unwrap();
        assert_eq!(batch.records()[1].revenue_per_unit, Metric::Undefined);
    }

    #[test]
    fn test_bad_period_fails_whole_batch_with_row() {
        let mut records = sample();
        records[2].period = "2024".to_string();
        match EnrichedBatch::enrich(&records) {
            Err(EngineError::InputFormat { row, label, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(label, "2024");
            }
            other => panic!("expected input format error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_key_rejected() {
        let mut records = sample();
        records[1].currency = "  ".to_string();
        match EnrichedBatch::enrich(&records) {
            Err(EngineError::IncompleteRecord { row, field }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "currency");
            }
            other => panic!("expected incomplete record, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_numeric_rejected() {
        let mut records = sample();
        records[0].exchange_rate = f64::NAN;
        let err = EnrichedBatch::enrich(&records).unwrap_err();
        assert_eq!(err.row(), Some(1));
        assert!(err.to_string().contains("exchange_rate"));
    }

    #[test]
    fn test_enrich_does_not_touch_input() {
        let records = sample();
        let before = records.clone();
        let _ = EnrichedBatch::enrich(&records).unwrap();
        assert_eq!(records, before);
    }

    #[test]
    fn test_summary_accessors() {
        let batch = EnrichedBatch::enrich(&sample()).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.regions(), vec!["EU", "US"]);
        assert_eq!(batch.models(), vec!["iPhone 14", "iPhone 15"]);
        assert_eq!(batch.currencies(), vec!["EUR", "USD"]);
        assert_eq!(batch.total_units(), 130);

        let summary = batch.summary();
        assert_eq!(summary.first_date, NaiveDate::from_ymd_opt(2023, 4, 1));
        assert_eq!(summary.last_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(summary.records, 3);
    }

    #[test]
    fn test_preview_keeps_input_order() {
        let batch = EnrichedBatch::enrich(&sample()).unwrap();
        let preview = batch.preview(2);
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0].record.region, "US");
        assert_eq!(batch.preview(50).len(), 3);
    }

    #[test]
    fn test_total_units_exceeding_u64() {
        let half = u64::MAX / 2 + 1;
        let mut first = sample()[0].clone();
        first.units_sold = half;
        let second = first.clone();
        let batch = EnrichedBatch::enrich(&[first, second]).unwrap();
        assert_eq!(batch.total_units(), u128::from(u64::MAX) + 1);
        assert_eq!(batch.summary().total_units, 1u128 << 64);
    }

    #[test]
    fn test_empty_batch() {
        let batch = EnrichedBatch::enrich(&[]).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.date_range(), None);
        assert_eq!(batch.summary().total_units, 0);
    }
}
