// Ingestion boundary: CSV parsing into typed records, then enrichment into the
// batch the analysis components share.
pub mod batch;
pub mod csv_parser;

pub use batch::EnrichedBatch;
pub use csv_parser::SalesCsvParser;
