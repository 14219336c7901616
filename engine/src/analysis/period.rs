// Period label resolution: "2023 Q4" -> 2023-10-01
use crate::error::EngineError;
use chrono::NaiveDate;
use shared::models::Quarter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPeriod {
    pub year: i32,
    pub quarter: Quarter,
    pub date: NaiveDate,
}

/// Resolves a fiscal period label to the first day of the quarter's start month.
///
/// The label must contain exactly one 4-digit year and exactly one quarter token
/// (`Q1`..`Q4`, upper-case `Q`). Any other text around them is ignored, so
/// "2023 Q4", "Q4 2023", "2023-Q4" and "FY2023 Q4" all resolve to 2023-10-01.
///
/// Errors carry row 0; callers that know the row use [`EngineError::at_row`].
pub fn resolve_period(label: &str) -> Result<ResolvedPeriod, EngineError> {
    let fail = |reason: String| EngineError::InputFormat {
        row: 0,
        label: label.to_string(),
        reason,
    };

    let mut years: Vec<&str> = Vec::new();
    let mut quarters: Vec<&str> = Vec::new();

    for (start, end) in digit_runs(label) {
        let run = &label[start..end];
        let after_q = start > 0 && label.as_bytes()[start - 1] == b'Q';
        if after_q && run.len() == 1 {
            quarters.push(&label[start - 1..end]);
        } else if run.len() == 4 {
            years.push(run);
        }
    }

    let year_str = match years.as_slice() {
        [] => return Err(fail("has no 4-digit year".to_string())),
        [only] => *only,
        _ => return Err(fail(format!("contains {} years, expected exactly one", years.len()))),
    };
    let quarter_str = match quarters.as_slice() {
        [] => return Err(fail("has no quarter token (Q1-Q4)".to_string())),
        [only] => *only,
        _ => return Err(fail(format!("contains {} quarter tokens, expected exactly one", quarters.len()))),
    };

    let quarter = Quarter::from_token(quarter_str)
        .ok_or_else(|| fail(format!("has invalid quarter '{}'", quarter_str)))?;
    let year: i32 = year_str
        .parse()
        .map_err(|_| fail(format!("has invalid year '{}'", year_str)))?;
    if year == 0 {
        return Err(fail("has invalid year '0000'".to_string()));
    }
    let date = NaiveDate::from_ymd_opt(year, quarter.start_month(), 1)
        .ok_or_else(|| fail(format!("has invalid year '{}'", year_str)))?;

    Ok(ResolvedPeriod { year, quarter, date })
}

// Byte ranges of maximal ASCII digit runs.
fn digit_runs(s: &str) -> Vec<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            runs.push((start, i));
        } else {
            i += 1;
        }
    }
    runs
}
