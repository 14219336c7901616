use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// One row of the input batch. Grouping keys are plain strings; an empty key is
// rejected by the engine before any aggregation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub period: String,
    pub region: String,
    pub model: String,
    pub units_sold: u64,
    pub currency: String,
    pub revenue_local: f64,
    pub revenue_usd: f64,
    pub exchange_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "Q1" => Some(Quarter::Q1),
            "Q2" => Some(Quarter::Q2),
            "Q3" => Some(Quarter::Q3),
            "Q4" => Some(Quarter::Q4),
            _ => None,
        }
    }

    /// Calendar month used as the canonical date of the quarter.
    /// Fixed mapping: Q1 -> 01, Q2 -> 04, Q3 -> 07, Q4 -> 10.
    pub fn start_month(self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 4,
            Quarter::Q3 => 7,
            Quarter::Q4 => 10,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A ratio that may have no value because its denominator was zero.
///
/// Kept as an explicit tag so sorting and averaging must decide what to do with
/// the undefined case instead of letting an infinity or NaN flow through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Defined(f64),
    Undefined,
}

impl Metric {
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Metric::Undefined;
        }
        Metric::Defined(numerator / denominator)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(v),
            Metric::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    // Ascending ranking order: every Undefined sits below every Defined value,
    // so a descending sort (`b.rank_cmp(&a)`) puts undefined metrics last.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Metric::Defined(a), Metric::Defined(b)) => a.total_cmp(b),
            (Metric::Defined(_), Metric::Undefined) => Ordering::Greater,
            (Metric::Undefined, Metric::Defined(_)) => Ordering::Less,
            (Metric::Undefined, Metric::Undefined) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Defined(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            Metric::Undefined => f.pad("undefined"),
        }
    }
}

// SalesRecord plus the fields derived once per pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: SalesRecord,
    pub year: i32,
    pub quarter: Quarter,
    pub date: NaiveDate,
    /// revenue_usd - revenue_local * exchange_rate, kept signed.
    pub revenue_diff: f64,
    /// revenue_usd / units_sold, undefined when no units were sold.
    pub revenue_per_unit: Metric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub group: String,
    pub units_sold: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRatePoint {
    pub date: NaiveDate,
    pub currency: String,
    pub mean_exchange_rate: f64,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDiff {
    pub currency: String,
    pub mean_revenue_diff: f64,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedCurrencyDiff {
    pub date: NaiveDate,
    pub currency: String,
    pub mean_revenue_diff: f64,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTotal {
    pub currency: String,
    pub total_revenue_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRow {
    pub region: String,
    pub model: String,
    pub record_count: usize,
    pub mean_units_sold: f64,
    pub mean_revenue_per_unit: Metric,
    /// Records of this pair whose revenue per unit was undefined.
    pub undefined_records: usize,
    /// Set when the pair has no defined efficiency and must not be read as a
    /// low-but-real value.
    pub flagged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendTables {
    pub region_trend: Vec<TrendPoint>,
    pub model_trend: Vec<TrendPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyTables {
    pub exchange_rate_trend: Vec<ExchangeRatePoint>,
    pub revenue_diff_by_currency: Vec<CurrencyDiff>,
    pub revenue_diff_by_date_currency: Vec<DatedCurrencyDiff>,
    pub total_usd_by_currency: Vec<CurrencyTotal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationTables {
    pub allocation_table: Vec<AllocationRow>,
    pub top_allocation: Vec<AllocationRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub records: usize,
    pub regions: Vec<String>,
    pub models: Vec<String>,
    pub currencies: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_units: u128,
}

// Everything a pipeline run produces, handed to the presentation shell as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: BatchSummary,
    pub trends: TrendTables,
    pub currency: CurrencyTables,
    pub allocation: AllocationTables,
}
