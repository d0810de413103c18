// WHY: run metrics persisted as JSON so long scans over monthly dumps can be compared afterwards

use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use tokio::fs;

use crate::reader::ReadStats;
use crate::scanner::ScanCounters;

/// Whole-run statistics written by `--stats-out`
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// RFC 3339 local timestamp of the run start
    pub run_start: String,
    pub inputs: Vec<ReadStats>,
    pub total_lines_read: u64,
    pub total_bytes_read: u64,
    pub records_scanned: u64,
    pub records_admitted: u64,
    pub records_parsed: u64,
    pub parse_failures: u64,
    pub matches: u64,
    /// A record was cut off by the end of input and dropped
    pub partial_record_dropped: bool,
    pub elapsed_ms: u64,
    pub records_per_sec: f64,
}

impl RunStats {
    pub fn new(run_start: DateTime<Local>) -> Self {
        Self {
            run_start: run_start.to_rfc3339(),
            inputs: Vec::new(),
            total_lines_read: 0,
            total_bytes_read: 0,
            records_scanned: 0,
            records_admitted: 0,
            records_parsed: 0,
            parse_failures: 0,
            matches: 0,
            partial_record_dropped: false,
            elapsed_ms: 0,
            records_per_sec: 0.0,
        }
    }

    pub fn add_input(&mut self, stats: ReadStats) {
        self.total_lines_read += stats.lines_read;
        self.total_bytes_read += stats.bytes_read;
        self.inputs.push(stats);
    }

    /// Copy the scanner's counters and derive throughput
    pub fn finish(&mut self, counters: ScanCounters, elapsed_ms: u64) {
        self.records_scanned = counters.records_scanned;
        self.records_admitted = counters.records_admitted;
        self.records_parsed = counters.records_parsed;
        self.parse_failures = counters.parse_failures;
        self.matches = counters.matches;
        self.elapsed_ms = elapsed_ms;
        self.records_per_sec = if elapsed_ms > 0 {
            counters.records_scanned as f64 / (elapsed_ms as f64 / 1000.0)
        } else {
            0.0
        };
    }
}

/// Write run statistics as pretty JSON, creating parent directories
pub async fn write_stats(stats: &RunStats, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(stats)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}
