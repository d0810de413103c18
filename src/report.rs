// WHY: stdout carries only result and progress lines, so every line is flushed as soon as it is known

use anyhow::Result;
use chrono::{Local, NaiveTime};
use clap::ValueEnum;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::scanner::{Match, ScanEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Fixed-width `| idx | ordinal | site | move | hi - lo |` rows
    #[default]
    Table,
    /// One JSON object per match
    Json,
}

/// `|  1 |   12345678 | https://lichess.org/abc | exf6# | 2400 - 2250 |`
pub fn format_match_table(found: &Match) -> String {
    let (high, low) = found.ratings;
    format!(
        "| {:>2} | {:>10} | {} | {:>5} | {} - {} |",
        found.index, found.ordinal, found.site, found.mating_move, high, low
    )
}

pub fn format_match_json(found: &Match) -> Result<String> {
    Ok(serde_json::to_string(found)?)
}

/// Ordinal right-aligned to ten places, then wall-clock time
pub fn format_progress(ordinal: u64, time: NaiveTime) -> String {
    format!("{:>10}, {}", ordinal, time.format("%H:%M:%S"))
}

/// Writes scan events as lines, flushing after each one
pub struct ReportWriter<W> {
    out: W,
    format: OutputFormat,
    lines_written: u64,
}

impl<W: AsyncWrite + Unpin> ReportWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            lines_written: 0,
        }
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub async fn write_event(&mut self, event: &ScanEvent) -> Result<()> {
        let line = match event {
            ScanEvent::Match(found) => match self.format {
                OutputFormat::Table => format_match_table(found),
                OutputFormat::Json => format_match_json(found)?,
            },
            ScanEvent::Progress { ordinal } => format_progress(*ordinal, Local::now().time()),
        };
        self.write_line(&line).await
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.out.write_all(line.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
