//! Statistics and reports
//!
//! Round-end network summaries, the sink they are written to, the JSON test log
//! and the CSV export built from it.

pub mod export;
pub mod summary;
pub mod test_log;

pub use export::{export_csv, parse_frequency, rows_from_log, write_csv, ReportRow};
pub use summary::{frequency_summary, NetworkSummary};
pub use test_log::{TestLog, TestRecord};

use serde_json::Value;

/// Destination for named statistics series
pub trait StatsSink {
    fn record(&mut self, key: &str, value: Value);
}
