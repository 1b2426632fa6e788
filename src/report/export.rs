// Flattens a statistics log into one spreadsheet row per run.
// Flip counts are spread over "N Blocks Flipped" columns up to the largest
// flip count seen in any run.

use crate::error::{Result, SimError};
use crate::report::summary::{
    CHAIN_LENGTH_KEY, FREQUENCY_KEY, TOTAL_FLIPPED_KEY, TOTAL_SWITCHES_KEY,
};
use crate::report::{TestLog, TestRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub run: usize,
    pub blockchain_length: u64,
    pub flip_counts: BTreeMap<usize, u64>,
    pub total_flipped_blocks: u64,
    pub total_switches: u64,
}

/// Parse `"1 block flipped: 17, 2 blocks flipped: 7"` into `{1: 17, 2: 7}`
pub fn parse_frequency(summary: &str) -> Result<BTreeMap<usize, u64>> {
    let mut counts = BTreeMap::new();
    for entry in summary.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let malformed = || SimError::Report(format!("Malformed frequency entry: '{entry}'"));
        let (label, count) = entry.split_once(':').ok_or_else(malformed)?;
        let flipped = label
            .split_whitespace()
            .next()
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(malformed)?;
        if !label.trim_end().ends_with("flipped") {
            return Err(malformed());
        }
        let count = count.trim().parse::<u64>().map_err(|_| malformed())?;
        counts.insert(flipped, count);
    }
    Ok(counts)
}

fn last_value<'a>(test: &'a TestRecord, key: &str, run: usize) -> Result<&'a Value> {
    test.get(key)
        .and_then(|series| series.last())
        .ok_or_else(|| SimError::Report(format!("Run {run} has no '{key}' series")))
}

fn last_u64(test: &TestRecord, key: &str, run: usize) -> Result<u64> {
    last_value(test, key, run)?
        .as_u64()
        .ok_or_else(|| SimError::Report(format!("Run {run}: '{key}' is not an integer")))
}

/// One row per run, using the last recorded value of each series
pub fn rows_from_log(log: &TestLog) -> Result<Vec<ReportRow>> {
    log.tests()
        .iter()
        .enumerate()
        .map(|(index, test)| {
            let run = index + 1;
            let frequency = last_value(test, FREQUENCY_KEY, run)?
                .as_str()
                .ok_or_else(|| SimError::Report(format!("Run {run}: frequency is not a string")))?;
            Ok(ReportRow {
                run,
                blockchain_length: last_u64(test, CHAIN_LENGTH_KEY, run)?,
                flip_counts: parse_frequency(frequency)?,
                total_flipped_blocks: last_u64(test, TOTAL_FLIPPED_KEY, run)?,
                total_switches: last_u64(test, TOTAL_SWITCHES_KEY, run)?,
            })
        })
        .collect()
}

pub fn write_csv<W: Write>(rows: &[ReportRow], writer: W) -> Result<()> {
    let max_flipped = rows
        .iter()
        .filter_map(|row| row.flip_counts.keys().next_back().copied())
        .max()
        .unwrap_or(0);

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["Run #".to_string(), "Blockchain Length".to_string()];
    header.extend((1..=max_flipped).map(|n| format!("{n} Blocks Flipped")));
    header.push("Total Flipped Blocks".to_string());
    header.push("Total Switches".to_string());
    csv_writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.run.to_string(), row.blockchain_length.to_string()];
        record.extend(
            (1..=max_flipped).map(|n| row.flip_counts.get(&n).copied().unwrap_or(0).to_string()),
        );
        record.push(row.total_flipped_blocks.to_string());
        record.push(row.total_switches.to_string());
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Read a statistics log from `input` and write its CSV report to `output`
pub fn export_csv(input: &Path, output: &Path) -> Result<usize> {
    let log = TestLog::from_path(input)?;
    let rows = rows_from_log(&log)?;
    let file = std::fs::File::create(output)?;
    write_csv(&rows, file)?;
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::StatsSink;
    use serde_json::json;

    fn record_run(log: &mut TestLog, length: u64, frequency: &str, flipped: u64, switches: u64) {
        log.new_test();
        log.record(CHAIN_LENGTH_KEY, json!(length));
        log.record(FREQUENCY_KEY, json!(frequency));
        log.record(TOTAL_FLIPPED_KEY, json!(flipped));
        log.record(TOTAL_SWITCHES_KEY, json!(switches));
    }

    #[test]
    fn test_parse_frequency() {
        let counts = parse_frequency("1 block flipped: 17, 2 blocks flipped: 7").unwrap();
        assert_eq!(counts, [(1, 17), (2, 7)].into_iter().collect());
        assert!(parse_frequency("").unwrap().is_empty());
        assert!(parse_frequency("two blocks flipped: 3").is_err());
        assert!(parse_frequency("1 block flipped 3").is_err());
    }

    #[test]
    fn test_rows_take_last_value() {
        let mut log = TestLog::new();
        record_run(&mut log, 4, "", 0, 0);
        log.record(CHAIN_LENGTH_KEY, json!(9));

        let rows = rows_from_log(&log).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].run, 1);
        assert_eq!(rows[0].blockchain_length, 9);
    }

    #[test]
    fn test_missing_series_is_reported() {
        let mut log = TestLog::new();
        log.new_test();
        log.record(CHAIN_LENGTH_KEY, json!(3));
        let err = rows_from_log(&log).unwrap_err();
        assert!(err.to_string().contains("Frequency"));
    }

    #[test]
    fn test_csv_columns_span_largest_flip() {
        let mut log = TestLog::new();
        record_run(&mut log, 30, "1 block flipped: 5, 3 blocks flipped: 1", 8, 6);
        record_run(&mut log, 28, "2 blocks flipped: 2", 4, 2);

        let mut out = Vec::new();
        write_csv(&rows_from_log(&log).unwrap(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Run #,Blockchain Length,1 Blocks Flipped,2 Blocks Flipped,3 Blocks Flipped,Total Flipped Blocks,Total Switches"
        );
        assert_eq!(lines[1], "1,30,5,0,1,8,6");
        assert_eq!(lines[2], "2,28,0,2,0,4,2");
    }
}
