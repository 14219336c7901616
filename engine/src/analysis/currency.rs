// Exchange-rate trends and the revenue residual between reported USD revenue
// and local revenue converted at the record's own rate.
use super::fold::{group_fold, MeanAcc};
use super::Aggregator;
use shared::models::{CurrencyDiff, CurrencyTables, CurrencyTotal, DatedCurrencyDiff, EnrichedRecord, ExchangeRatePoint};

#[derive(Debug, Default, Clone, Copy)]
pub struct CurrencyAnalyzer;

impl CurrencyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    // Mean exchange rate per (date, currency).
    pub fn exchange_rate_trend(&self, records: &[EnrichedRecord]) -> Vec<ExchangeRatePoint> {
        group_fold(
            records,
            |r| (r.date, r.record.currency.as_str()),
            |r| r.record.exchange_rate,
            |(date, currency), acc: MeanAcc| ExchangeRatePoint {
                date,
                currency: currency.to_string(),
                mean_exchange_rate: acc.mean(),
                records: acc.count(),
            },
        )
    }

    // Mean signed residual per currency, across all dates.
    pub fn revenue_diff_by_currency(&self, records: &[EnrichedRecord]) -> Vec<CurrencyDiff> {
        group_fold(
            records,
            |r| r.record.currency.as_str(),
            |r| r.revenue_diff,
            |currency, acc: MeanAcc| CurrencyDiff {
                currency: currency.to_string(),
                mean_revenue_diff: acc.mean(),
                records: acc.count(),
            },
        )
    }

    pub fn revenue_diff_by_date_currency(&self, records: &[EnrichedRecord]) -> Vec<DatedCurrencyDiff> {
        group_fold(
            records,
            |r| (r.date, r.record.currency.as_str()),
            |r| r.revenue_diff,
            |(date, currency), acc: MeanAcc| DatedCurrencyDiff {
                date,
                currency: currency.to_string(),
                mean_revenue_diff: acc.mean(),
                records: acc.count(),
            },
        )
    }

    // Total USD revenue per currency, largest first; equal totals fall back to
    // currency code order.
    pub fn total_usd_by_currency(&self, records: &[EnrichedRecord]) -> Vec<CurrencyTotal> {
        let mut totals = group_fold(
            records,
            |r| r.record.currency.as_str(),
            |r| r.record.revenue_usd,
            |currency, acc: MeanAcc| CurrencyTotal {
                currency: currency.to_string(),
                total_revenue_usd: acc.sum(),
            },
        );
        totals.sort_by(|a, b| {
            b.total_revenue_usd
                .total_cmp(&a.total_revenue_usd)
                .then_with(|| a.currency.cmp(&b.currency))
        });
        totals
    }
}

impl Aggregator for CurrencyAnalyzer {
    type Output = CurrencyTables;

    fn name(&self) -> &str {
        "currency"
    }

    fn compute(&self, records: &[EnrichedRecord]) -> CurrencyTables {
        let tables = CurrencyTables {
            exchange_rate_trend: self.exchange_rate_trend(records),
            revenue_diff_by_currency: self.revenue_diff_by_currency(records),
            revenue_diff_by_date_currency: self.revenue_diff_by_date_currency(records),
            total_usd_by_currency: self.total_usd_by_currency(records),
        };
        for diff in &tables.revenue_diff_by_currency {
            tracing::debug!(
                currency = %diff.currency,
                mean_revenue_diff = diff.mean_revenue_diff,
                records = diff.records,
                "Currency revenue residual"
            );
        }
        tables
    }
}
