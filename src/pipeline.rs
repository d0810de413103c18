// WHY: all inputs form one logical stream, so record state carries across file boundaries

use anyhow::Result;
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tokio::io::AsyncWrite;
use tracing::{info, warn};

use crate::reader::{InputSource, LineReader, ReaderConfig};
use crate::report::{OutputFormat, ReportWriter};
use crate::scanner::{ScanConfig, Scanner};
use crate::stats::RunStats;

/// Spinner message refresh period, in records
const SPINNER_REFRESH_RECORDS: u64 = 10_000;

/// Everything a run needs besides its inputs
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub scan: ScanConfig,
    pub reader: ReaderConfig,
    pub format: OutputFormat,
    /// Show a spinner on stderr
    pub show_progress: bool,
}

/// Drives line sources through a [`Scanner`] into a [`ReportWriter`]
pub struct Pipeline<W> {
    scanner: Scanner,
    writer: ReportWriter<W>,
    reader_config: ReaderConfig,
    spinner: Option<ProgressBar>,
    stats: RunStats,
    started: Instant,
}

impl<W: AsyncWrite + Unpin> Pipeline<W> {
    pub fn new(config: PipelineConfig, out: W) -> Result<Self> {
        let spinner = if config.show_progress {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
            Some(spinner)
        } else {
            None
        };

        Ok(Self {
            scanner: Scanner::new(config.scan)?,
            writer: ReportWriter::new(out, config.format),
            reader_config: config.reader,
            spinner,
            stats: RunStats::new(Local::now()),
            started: Instant::now(),
        })
    }

    /// Emit the start-of-run progress line
    pub async fn start(&mut self) -> Result<()> {
        info!(config = ?self.scanner.config(), "Starting scan");
        let event = self.scanner.progress();
        self.writer.write_event(&event).await
    }

    /// Open a source and scan all of its lines
    pub async fn scan_source(&mut self, source: InputSource) -> Result<()> {
        let reader = LineReader::open(source, &self.reader_config).await?;
        self.scan_reader(reader).await
    }

    /// Scan every line of an already opened reader
    pub async fn scan_reader(&mut self, mut reader: LineReader) -> Result<()> {
        let mut last_refresh = self.scanner.counters().records_scanned;
        while let Some(line) = reader.next_line().await? {
            let events = self.scanner.push_line(&line)?;
            for event in &events {
                self.writer.write_event(event).await?;
            }

            let counters = self.scanner.counters();
            if counters.records_scanned >= last_refresh + SPINNER_REFRESH_RECORDS {
                last_refresh = counters.records_scanned;
                if let Some(spinner) = &self.spinner {
                    spinner.set_message(format!(
                        "Records: {} | Admitted: {} | Matches: {}",
                        counters.records_scanned, counters.records_admitted, counters.matches
                    ));
                    spinner.tick();
                }
            }
        }
        self.stats.add_input(reader.finish());
        Ok(())
    }

    /// Close the run and return its statistics along with the output sink
    pub fn finish(mut self) -> (RunStats, W) {
        if self.scanner.has_partial_record() {
            warn!(
                ordinal = self.scanner.next_ordinal(),
                "Input ended inside a record; it was dropped"
            );
            self.stats.partial_record_dropped = true;
        }
        if let Some(spinner) = &self.spinner {
            spinner.finish_and_clear();
        }

        let counters = self.scanner.counters();
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        self.stats.finish(counters, elapsed_ms);
        info!(
            records = counters.records_scanned,
            admitted = counters.records_admitted,
            parse_failures = counters.parse_failures,
            matches = counters.matches,
            elapsed_ms,
            "Scan complete"
        );
        (self.stats, self.writer.into_inner())
    }
}
