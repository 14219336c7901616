// Presentation helpers for the binary: text tables and JSON export.
pub mod export;
pub mod format;

pub use export::write_report_json;
pub use format::format_report;
