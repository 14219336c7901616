// Fixed-width text rendering of the analysis tables for the terminal.
use crate::analysis::AllocationOptimizer;
use shared::models::{
    AllocationRow, AnalysisReport, BatchSummary, CurrencyDiff, CurrencyTotal, DatedCurrencyDiff, EnrichedRecord,
    ExchangeRatePoint, TrendPoint,
};
use shared::utils::{format_amount, format_units};

pub fn format_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    out.push_str("=== Sales Analysis ===\n");
    out.push_str(&format!("Records: {}\n", summary.records));
    match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => out.push_str(&format!("Periods: {} .. {}\n", first, last)),
        _ => out.push_str("Periods: none\n"),
    }
    out.push_str(&line(&format!("Regions: {}", summary.regions.join(", "))));
    out.push_str(&line(&format!("Models: {}", summary.models.join(", "))));
    out.push_str(&line(&format!("Currencies: {}", summary.currencies.join(", "))));
    out.push_str(&format!("Total units: {}\n", format_units(summary.total_units)));
    out
}

pub fn format_trend(title: &str, rows: &[TrendPoint]) -> String {
    let mut out = section(title);
    out.push_str(&line(&format!("{:<10} {:<20} {:>14}", "date", "group", "units_sold")));
    out.push_str(&line(&format!("{:-<10} {:-<20} {:-<14}", "", "", "")));
    for r in rows {
        out.push_str(&line(&format!(
            "{:<10} {:<20} {:>14}",
            r.date.to_string(),
            r.group,
            format_units(r.units_sold)
        )));
    }
    out
}

pub fn format_exchange_rates(rows: &[ExchangeRatePoint]) -> String {
    let mut out = section("Exchange rate trend (mean per date and currency)");
    out.push_str(&line(&format!("{:<10} {:<8} {:>14} {:>8}", "date", "currency", "mean_rate", "records")));
    out.push_str(&line(&format!("{:-<10} {:-<8} {:-<14} {:-<8}", "", "", "", "")));
    for r in rows {
        out.push_str(&line(&format!(
            "{:<10} {:<8} {:>14.6} {:>8}",
            r.date.to_string(),
            r.currency,
            r.mean_exchange_rate,
            r.records
        )));
    }
    out
}

pub fn format_currency_diffs(rows: &[CurrencyDiff]) -> String {
    let mut out = section("Average revenue difference by currency (USD)");
    out.push_str(&line(&format!("{:<8} {:>20} {:>8}", "currency", "mean_revenue_diff", "records")));
    out.push_str(&line(&format!("{:-<8} {:-<20} {:-<8}", "", "", "")));
    for r in rows {
        out.push_str(&line(&format!(
            "{:<8} {:>20} {:>8}",
            r.currency,
            format_amount(r.mean_revenue_diff, 2),
            r.records
        )));
    }
    out
}

pub fn format_dated_currency_diffs(rows: &[DatedCurrencyDiff]) -> String {
    let mut out = section("Average revenue difference by date and currency (USD)");
    out.push_str(&line(&format!(
        "{:<10} {:<8} {:>20} {:>8}",
        "date", "currency", "mean_revenue_diff", "records"
    )));
    out.push_str(&line(&format!("{:-<10} {:-<8} {:-<20} {:-<8}", "", "", "", "")));
    for r in rows {
        out.push_str(&line(&format!(
            "{:<10} {:<8} {:>20} {:>8}",
            r.date.to_string(),
            r.currency,
            format_amount(r.mean_revenue_diff, 2),
            r.records
        )));
    }
    out
}

pub fn format_currency_totals(rows: &[CurrencyTotal]) -> String {
    let mut out = section("Total USD revenue by currency");
    out.push_str(&line(&format!("{:<8} {:>22}", "currency", "total_revenue_usd")));
    out.push_str(&line(&format!("{:-<8} {:-<22}", "", "")));
    for r in rows {
        out.push_str(&line(&format!("{:<8} {:>22}", r.currency, format_amount(r.total_revenue_usd, 2))));
    }
    out
}

pub fn format_allocation(title: &str, rows: &[AllocationRow]) -> String {
    let mut out = section(title);
    out.push_str(&line(&format!(
        "{:<12} {:<20} {:>14} {:>16} {:>7} {:<4}",
        "region", "model", "mean_units", "revenue_per_unit", "records", "flag"
    )));
    out.push_str(&line(&format!(
        "{:-<12} {:-<20} {:-<14} {:-<16} {:-<7} {:-<4}",
        "", "", "", "", "", ""
    )));
    for r in rows {
        let efficiency = match r.mean_revenue_per_unit.value() {
            Some(v) => format_amount(v, 2),
            None => r.mean_revenue_per_unit.to_string(),
        };
        out.push_str(&line(&format!(
            "{:<12} {:<20} {:>14} {:>16} {:>7} {:<4}",
            r.region,
            r.model,
            format_amount(r.mean_units_sold, 1),
            efficiency,
            r.record_count,
            if r.flagged { "!" } else { "" }
        )));
    }
    out
}

pub fn format_dataset_preview(rows: &[EnrichedRecord]) -> String {
    let mut out = section("Dataset preview");
    out.push_str(&line(&format!(
        "{:<10} {:<10} {:<12} {:<20} {:>12} {:<8} {:>14} {:>10}",
        "period", "date", "region", "model", "units_sold", "currency", "revenue_usd", "rate"
    )));
    out.push_str(&line(&format!(
        "{:-<10} {:-<10} {:-<12} {:-<20} {:-<12} {:-<8} {:-<14} {:-<10}",
        "", "", "", "", "", "", "", ""
    )));
    for r in rows {
        out.push_str(&line(&format!(
            "{:<10} {:<10} {:<12} {:<20} {:>12} {:<8} {:>14} {:>10.4}",
            r.record.period,
            r.date.to_string(),
            r.record.region,
            r.record.model,
            format_units(u128::from(r.record.units_sold)),
            r.record.currency,
            format_amount(r.record.revenue_usd, 2),
            r.record.exchange_rate
        )));
    }
    out
}

/// Renders the whole report; `allocation_rows` caps the ranked allocation
/// table, the top-allocation table is always shown in full.
pub fn format_report(report: &AnalysisReport, preview: &[EnrichedRecord], allocation_rows: usize) -> String {
    let allocation = &report.allocation.allocation_table;
    let shown = AllocationOptimizer::new().preview(allocation, allocation_rows);

    [
        format_summary(&report.summary),
        format_trend("Regional sales over time", &report.trends.region_trend),
        format_trend("Sales by model over time", &report.trends.model_trend),
        format_exchange_rates(&report.currency.exchange_rate_trend),
        format_currency_diffs(&report.currency.revenue_diff_by_currency),
        format_dated_currency_diffs(&report.currency.revenue_diff_by_date_currency),
        format_currency_totals(&report.currency.total_usd_by_currency),
        format_allocation(
            &format!("Average units sold & revenue efficiency (top {} of {})", shown.len(), allocation.len()),
            shown,
        ),
        format_allocation("Top recommended region-model allocation", &report.allocation.top_allocation),
        format_dataset_preview(preview),
    ]
    .join("\n")
}

fn section(title: &str) -> String {
    format!("{}:\n", title)
}

fn line(s: &str) -> String {
    format!("{}\n", s.trim_end())
}
