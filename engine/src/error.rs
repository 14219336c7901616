use thiserror::Error;

// `row` is always the 1-based data row (the header is not counted), so row 1 is
// line 2 of the CSV file.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Input format error at row {row}: period label '{label}' {reason}")]
    InputFormat {
        row: usize,
        label: String,
        reason: String,
    },

    #[error("Incomplete record at row {row}: missing value for '{field}'")]
    IncompleteRecord { row: usize, field: String },

    #[error("Invalid value at row {row}: column '{column}' has value '{value}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Internal processing error: {0}")]
    ProcessingError(String),
}

impl EngineError {
    // Attaches a row number to an error raised without one (period parsing is
    // row-agnostic; the caller knows where the label came from).
    pub fn at_row(self, row: usize) -> Self {
        match self {
            EngineError::InputFormat { label, reason, .. } => EngineError::InputFormat { row, label, reason },
            EngineError::IncompleteRecord { field, .. } => EngineError::IncompleteRecord { row, field },
            EngineError::InvalidValue { column, value, .. } => EngineError::InvalidValue { row, column, value },
            other => other,
        }
    }

    pub fn row(&self) -> Option<usize> {
        match self {
            EngineError::InputFormat { row, .. }
            | EngineError::IncompleteRecord { row, .. }
            | EngineError::InvalidValue { row, .. } => Some(*row),
            _ => None,
        }
    }
}
