use crate::error::EngineError;
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::SalesRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

// Contract column names. They are matched exactly (after trimming), so a renamed
// column is reported as missing rather than guessed at.
pub const COL_PERIOD: &str = "Quarter";
pub const COL_REGION: &str = "Region";
pub const COL_MODEL: &str = "iPhone Model";
pub const COL_UNITS: &str = "Units Sold";
pub const COL_CURRENCY: &str = "Currency";
pub const COL_REVENUE_LOCAL: &str = "Revenue (Local)";
pub const COL_REVENUE_USD: &str = "Revenue (USD)";
pub const COL_EXCHANGE_RATE: &str = "Exchange Rate";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_PERIOD,
    COL_REGION,
    COL_MODEL,
    COL_UNITS,
    COL_CURRENCY,
    COL_REVENUE_LOCAL,
    COL_REVENUE_USD,
    COL_EXCHANGE_RATE,
];

// Position of every required column in the file's header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    period: usize,
    region: usize,
    model: usize,
    units: usize,
    currency: usize,
    revenue_local: usize,
    revenue_usd: usize,
    exchange_rate: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, EngineError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').trim())
            .collect();
        let position = |name: &str| names.iter().position(|h| *h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|name| position(*name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            tracing::error!(?missing, "Sales CSV is missing required columns");
            return Err(EngineError::Schema { missing });
        }

        // Every lookup below succeeded in the check above.
        let idx = |name: &str| position(name).unwrap_or_default();
        Ok(ColumnIndex {
            period: idx(COL_PERIOD),
            region: idx(COL_REGION),
            model: idx(COL_MODEL),
            units: idx(COL_UNITS),
            currency: idx(COL_CURRENCY),
            revenue_local: idx(COL_REVENUE_LOCAL),
            revenue_usd: idx(COL_REVENUE_USD),
            exchange_rate: idx(COL_EXCHANGE_RATE),
        })
    }
}

pub struct SalesCsvParser;

impl SalesCsvParser {
    // CSV Header: Quarter,Region,iPhone Model,Units Sold,Currency,Revenue (Local),Revenue (USD),Exchange Rate
    // Example Row: 2023 Q4,EU,iPhone 15,120000,EUR,98000000,107800000,1.1
    pub fn load_records_from_csv(file_path: &Path, delimiter: u8) -> Result<Vec<SalesRecord>, EngineError> {
        let file = File::open(file_path).map_err(|e| {
            tracing::error!(path = %file_path.display(), error = %e, "Failed to open sales CSV");
            EngineError::from(e)
        })?;
        tracing::info!("Reading sales records from '{}'", file_path.display());
        Self::load_records_from_reader(BufReader::new(file), delimiter)
    }

    pub fn load_records_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Vec<SalesRecord>, EngineError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut records = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let row = idx + 1;
            let record = result?;
            records.push(Self::parse_row(&record, &columns, row)?);
        }

        tracing::info!("Loaded {} sales records", records.len());
        Ok(records)
    }

    fn parse_row(record: &StringRecord, columns: &ColumnIndex, row: usize) -> Result<SalesRecord, EngineError> {
        let period = Self::get_required(record, columns.period, COL_PERIOD, row)?;
        let region = Self::get_required(record, columns.region, COL_REGION, row)?;
        let model = Self::get_required(record, columns.model, COL_MODEL, row)?;
        let units_str = Self::get_required(record, columns.units, COL_UNITS, row)?;
        let currency = Self::get_required(record, columns.currency, COL_CURRENCY, row)?;
        let local_str = Self::get_required(record, columns.revenue_local, COL_REVENUE_LOCAL, row)?;
        let usd_str = Self::get_required(record, columns.revenue_usd, COL_REVENUE_USD, row)?;
        let rate_str = Self::get_required(record, columns.exchange_rate, COL_EXCHANGE_RATE, row)?;

        Ok(SalesRecord {
            period: period.to_string(),
            region: region.to_string(),
            model: model.to_string(),
            units_sold: parse_units(units_str).ok_or_else(|| invalid(row, COL_UNITS, units_str))?,
            currency: currency.to_string(),
            revenue_local: parse_amount(local_str).ok_or_else(|| invalid(row, COL_REVENUE_LOCAL, local_str))?,
            revenue_usd: parse_amount(usd_str).ok_or_else(|| invalid(row, COL_REVENUE_USD, usd_str))?,
            exchange_rate: parse_amount(rate_str).ok_or_else(|| invalid(row, COL_EXCHANGE_RATE, rate_str))?,
        })
    }

    // A blank cell counts as missing: the record is incomplete, not zero.
    fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str, row: usize) -> Result<&'a str, EngineError> {
        record
            .get(idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EngineError::IncompleteRecord {
                row,
                field: name.to_string(),
            })
    }
}

fn invalid(row: usize, column: &str, value: &str) -> EngineError {
    EngineError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

// Units are whole and non-negative; spreadsheet exports sometimes write them
// as "120000.0", which is accepted.
fn parse_units(s: &str) -> Option<u64> {
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

fn parse_amount(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Quarter,Region,iPhone Model,Units Sold,Currency,Revenue (Local),Revenue (USD),Exchange Rate";

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    fn parse(content: &str) -> Result<Vec<SalesRecord>, EngineError> {
        SalesCsvParser::load_records_from_reader(content.as_bytes(), b',')
    }

    #[test]
    fn test_load_records_from_csv_valid_data() {
        let csv_content = format!(
            "{}\n2023 Q4,EU,iPhone 15,120000,EUR,98000000,107800000,1.1\n2024 Q1,Asia,iPhone 14,80000,INR,5000000000,60000000,0.012",
            HEADER
        );
        let tmp_file = create_test_csv(&csv_content);
        let records = SalesCsvParser::load_records_from_csv(tmp_file.path(), b',').unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period, "2023 Q4");
        assert_eq!(records[0].region, "EU");
        assert_eq!(records[0].model, "iPhone 15");
        assert_eq!(records[0].units_sold, 120000);
        assert_eq!(records[0].currency, "EUR");
        assert_eq!(records[0].revenue_local, 98000000.0);
        assert_eq!(records[0].revenue_usd, 107800000.0);
        assert_eq!(records[0].exchange_rate, 1.1);

        assert_eq!(records[1].region, "Asia");
        assert_eq!(records[1].exchange_rate, 0.012);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SalesCsvParser::load_records_from_csv(Path::new("/no/such/sales.csv"), b',');
        assert!(matches!(result, Err(EngineError::IoError { .. })));
    }

    #[test]
    fn test_header_only_gives_empty_batch() {
        let records = parse(HEADER).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_columns_reported_together() {
        let csv_content = "Quarter,Region,iPhone Model,Units Sold,Revenue (USD)\n2023 Q4,EU,iPhone 15,10,100";
        match parse(csv_content) {
            Err(EngineError::Schema { missing }) => {
                assert_eq!(missing, vec!["Currency", "Revenue (Local)", "Exchange Rate"]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_column_order_and_extra_columns_do_not_matter() {
        let csv_content = "\
Exchange Rate,Notes,Revenue (USD),Revenue (Local),Currency,Units Sold,iPhone Model,Region,Quarter
1.0,ignored,1000,1000,USD,10,iPhone 14,US,2023 Q2";
        let records = parse(csv_content).unwrap();
        assert_eq!(records[0].region, "US");
        assert_eq!(records[0].model, "iPhone 14");
        assert_eq!(records[0].period, "2023 Q2");
        assert_eq!(records[0].units_sold, 10);
    }

    #[test]
    fn test_bom_and_padded_headers_are_normalized() {
        let csv_content = "\u{feff}Quarter , Region,iPhone Model,Units Sold,Currency,Revenue (Local),Revenue (USD),Exchange Rate\n2023 Q4,EU,iPhone 15,1,EUR,1,1,1";
        let records = parse(csv_content).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let csv_content = "Quarter;Region;iPhone Model;Units Sold;Currency;Revenue (Local);Revenue (USD);Exchange Rate\n2023 Q4;EU;iPhone 15;5;EUR;100;110;1.1";
        let records = SalesCsvParser::load_records_from_reader(csv_content.as_bytes(), b';').unwrap();
        assert_eq!(records[0].units_sold, 5);
    }

    #[test]
    fn test_blank_grouping_key_is_incomplete() {
        let csv_content = format!("{}\n2023 Q4,EU,iPhone 15,1,EUR,1,1,1\n2023 Q4,,iPhone 15,1,EUR,1,1,1", HEADER);
        match parse(&csv_content) {
            Err(EngineError::IncompleteRecord { row, field }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "Region");
            }
            other => panic!("expected incomplete record, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_exchange_rate_is_incomplete() {
        let csv_content = format!("{}\n2023 Q4,EU,iPhone 15,1,EUR,1,1,", HEADER);
        let err = parse(&csv_content).unwrap_err();
        assert!(err.to_string().contains("missing value for 'Exchange Rate'"));
    }

    #[test]
    fn test_units_accept_integral_float() {
        let csv_content = format!("{}\n2023 Q4,EU,iPhone 15,120000.0,EUR,1,1,1", HEADER);
        assert_eq!(parse(&csv_content).unwrap()[0].units_sold, 120000);
    }

    #[test]
    fn test_negative_or_fractional_units_rejected() {
        for bad in ["-5", "2.5", "many"] {
            let csv_content = format!("{}\n2023 Q4,EU,iPhone 15,{},EUR,1,1,1", HEADER, bad);
            match parse(&csv_content) {
                Err(EngineError::InvalidValue { row, column, value }) => {
                    assert_eq!(row, 1);
                    assert_eq!(column, "Units Sold");
                    assert_eq!(value, bad);
                }
                other => panic!("expected invalid value for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_units_beyond_u64_rejected() {
        let max = format!("{}\n2023 Q4,EU,iPhone 15,{},EUR,1,1,1", HEADER, u64::MAX);
        assert_eq!(parse(&max).unwrap()[0].units_sold, u64::MAX);

        for bad in ["18446744073709551616", "18446744073709551616.0", "1.8446744073709552e19", "1e30"] {
            let csv_content = format!("{}\n2023 Q4,EU,iPhone 15,{},EUR,1,1,1", HEADER, bad);
            match parse(&csv_content) {
                Err(EngineError::InvalidValue { column, value, .. }) => {
                    assert_eq!(column, "Units Sold");
                    assert_eq!(value, bad);
                }
                other => panic!("expected invalid value for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_non_numeric_revenue_rejected() {
        let csv_content = format!("{}\n2023 Q4,EU,iPhone 15,1,EUR,lots,1,1", HEADER);
        let err = parse(&csv_content).unwrap_err();
        assert!(err.to_string().contains("Revenue (Local)"));
    }

    #[test]
    fn test_ragged_row_is_csv_error() {
        let csv_content = format!("{}\n2023 Q4,EU,iPhone 15", HEADER);
        assert!(matches!(parse(&csv_content), Err(EngineError::CsvSystemError { .. })));
    }
}
