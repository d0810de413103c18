// WHY: threads segmenter → parser → detector per line and turns results into events for the writer

use anyhow::Result;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::warn;

use crate::detector;
use crate::error::ParseError;
use crate::pgn::{parse_entry, MovetextNormalizer};
use crate::segmenter::{AdmittedRecord, Segment, Segmenter, DEFAULT_MIN_ELO};

/// Configuration for one scan
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Both ratings must be strictly above this
    pub min_elo: u32,
    /// Emit a progress event every this many records
    pub progress_interval: u64,
    /// Abort on the first malformed admitted record instead of skipping it
    pub strict: bool,
    /// Keep only the first and last turns of long movetext
    pub truncate_movetext: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_elo: DEFAULT_MIN_ELO,
            progress_interval: 1_000_000,
            strict: true,
            truncate_movetext: true,
        }
    }
}

/// One detected en passant checkmate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    /// Running match index, from 1
    pub index: u64,
    /// Ordinal of the record in the input stream, from 1
    pub ordinal: u64,
    pub site: String,
    pub move_number: u32,
    pub mating_move: String,
    /// Higher rating first
    pub ratings: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Match(Match),
    /// Scanning is about to start on record `ordinal`
    Progress { ordinal: u64 },
}

pub type ScanEvents = SmallVec<[ScanEvent; 2]>;

/// Running totals for one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounters {
    pub records_scanned: u64,
    pub records_admitted: u64,
    pub records_parsed: u64,
    pub parse_failures: u64,
    pub matches: u64,
}

/// Streaming en passant mate finder. Feed it lines; it reports matches and progress.
pub struct Scanner {
    config: ScanConfig,
    segmenter: Segmenter,
    next_match_index: u64,
    counters: ScanCounters,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let normalizer = MovetextNormalizer::new()?.with_truncation(config.truncate_movetext);
        let segmenter = Segmenter::new(config.min_elo, normalizer);
        Ok(Self {
            config,
            segmenter,
            next_match_index: 1,
            counters: ScanCounters::default(),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn counters(&self) -> ScanCounters {
        self.counters
    }

    /// Progress event announcing the record about to be scanned
    pub fn progress(&self) -> ScanEvent {
        ScanEvent::Progress {
            ordinal: self.segmenter.next_ordinal(),
        }
    }

    /// Ordinal the record currently being read will get
    pub fn next_ordinal(&self) -> u64 {
        self.segmenter.next_ordinal()
    }

    /// True when input ended in the middle of a record
    pub fn has_partial_record(&self) -> bool {
        self.segmenter.has_partial_record()
    }

    /// Feed one line without its terminator.
    ///
    /// In strict mode a malformed admitted record is returned as an error; in
    /// lenient mode it is logged, counted and skipped.
    pub fn push_line(&mut self, line: &str) -> Result<ScanEvents, ParseError> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut events = ScanEvents::new();
        let Some(segment) = self.segmenter.push_line(line) else {
            return Ok(events);
        };

        self.counters.records_scanned += 1;
        if let Segment::Admitted(record) = segment {
            self.counters.records_admitted += 1;
            if let Some(found) = self.process(&record)? {
                events.push(ScanEvent::Match(found));
            }
        }

        let interval = self.config.progress_interval;
        if interval > 0 && self.segmenter.next_ordinal() % interval == 0 {
            events.push(self.progress());
        }
        Ok(events)
    }

    fn process(&mut self, admitted: &AdmittedRecord) -> Result<Option<Match>, ParseError> {
        let record = match parse_entry(&admitted.text, admitted.ordinal) {
            Ok(record) => record,
            Err(err) if self.config.strict => return Err(err),
            Err(err) => {
                warn!(ordinal = admitted.ordinal, error = %err, "skipping malformed record");
                self.counters.parse_failures += 1;
                return Ok(None);
            }
        };
        self.counters.records_parsed += 1;

        let Some(detection) = detector::detect(&record) else {
            return Ok(None);
        };

        let found = Match {
            index: self.next_match_index,
            ordinal: admitted.ordinal,
            site: record.site().unwrap_or("?").to_string(),
            move_number: detection.move_number,
            mating_move: detection.mating_move.to_string(),
            ratings: admitted.ratings,
        };
        self.next_match_index += 1;
        self.counters.matches += 1;
        Ok(Some(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(site: &str, white: u32, black: u32, movetext: &str) -> String {
        format!(
            "[Event \"Rated Blitz game\"]\n[Site \"{site}\"]\n[WhiteElo \"{white}\"]\n[BlackElo \"{black}\"]\n\n{movetext}\n\n"
        )
    }

    fn run(scanner: &mut Scanner, text: &str) -> Result<Vec<ScanEvent>, ParseError> {
        let mut events = Vec::new();
        for line in text.lines() {
            events.extend(scanner.push_line(line)?);
        }
        Ok(events)
    }

    fn matches(events: &[ScanEvent]) -> Vec<&Match> {
        events
            .iter()
            .filter_map(|event| match event {
                ScanEvent::Match(found) => Some(found),
                ScanEvent::Progress { .. } => None,
            })
            .collect()
    }

    const MATE: &str = "1. e4 { [%clk 0:03:00] } 1... c6 { [%clk 0:03:00] } 2. d4 d5 3. e5 Bf5 4. Nf3 e6 5. Be2 Nd7 6. Kf1 f5 7. exf6# 1-0";

    #[test]
    fn test_detects_mate_in_admitted_record() {
        let mut scanner = Scanner::new(ScanConfig::default()).unwrap();
        let text = game("https://lichess.org/ep000001", 2250, 2400, MATE);
        let events = run(&mut scanner, &text).unwrap();

        let found = matches(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 1);
        assert_eq!(found[0].ordinal, 1);
        assert_eq!(found[0].site, "https://lichess.org/ep000001");
        assert_eq!(found[0].mating_move, "exf6#");
        assert_eq!(found[0].move_number, 7);
        assert_eq!(found[0].ratings, (2400, 2250));
    }

    #[test]
    fn test_low_rated_mate_ignored() {
        let mut scanner = Scanner::new(ScanConfig::default()).unwrap();
        let text = game("s", 2100, 2400, MATE);
        let events = run(&mut scanner, &text).unwrap();

        assert!(matches(&events).is_empty());
        assert_eq!(scanner.counters().records_scanned, 1);
        assert_eq!(scanner.counters().records_admitted, 0);
    }

    #[test]
    fn test_match_indices_and_ordinals() {
        let mut scanner = Scanner::new(ScanConfig::default()).unwrap();
        let quiet = "1. d4 d5 2. c4 e6 3. Nc3 Nf6 1/2-1/2";
        let text = [
            game("a", 2300, 2300, MATE),
            game("b", 2300, 2300, quiet),
            game("c", 1500, 1500, MATE),
            game("d", 2500, 2600, MATE),
        ]
        .concat();
        let events = run(&mut scanner, &text).unwrap();

        let found: Vec<(u64, u64, &str)> = matches(&events)
            .iter()
            .map(|m| (m.index, m.ordinal, m.site.as_str()))
            .collect();
        assert_eq!(found, vec![(1, 1, "a"), (2, 4, "d")]);

        let counters = scanner.counters();
        assert_eq!(counters.records_scanned, 4);
        assert_eq!(counters.records_admitted, 3);
        assert_eq!(counters.records_parsed, 3);
        assert_eq!(counters.matches, 2);
    }

    #[test]
    fn test_strict_mode_reports_ordinal() {
        let mut scanner = Scanner::new(ScanConfig::default()).unwrap();
        let text = [
            game("ok", 2300, 2300, "1. e4 e5 1-0"),
            game("bad", 2300, 2300, "1. e4 e5 2. Nf3 (2. Nc3) 1-0"),
        ]
        .concat();
        let err = run(&mut scanner, &text).unwrap_err();
        assert_eq!(err.ordinal, 2);
    }

    #[test]
    fn test_lenient_mode_skips_malformed_record() {
        let config = ScanConfig {
            strict: false,
            ..Default::default()
        };
        let mut scanner = Scanner::new(config).unwrap();
        let text = [
            game("bad", 2300, 2300, "1. e4 e5 2. Nf3 (2. Nc3) 1-0"),
            game("good", 2300, 2300, MATE),
        ]
        .concat();
        let events = run(&mut scanner, &text).unwrap();

        let found = matches(&events);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].ordinal, 2);
        assert_eq!(scanner.counters().parse_failures, 1);
    }

    #[test]
    fn test_progress_every_interval() {
        let config = ScanConfig {
            progress_interval: 2,
            ..Default::default()
        };
        let mut scanner = Scanner::new(config).unwrap();
        assert_eq!(scanner.progress(), ScanEvent::Progress { ordinal: 1 });

        let text = game("x", 1000, 1000, "1. e4 1-0").repeat(5);
        let events = run(&mut scanner, &text).unwrap();
        assert_eq!(
            events,
            vec![
                ScanEvent::Progress { ordinal: 2 },
                ScanEvent::Progress { ordinal: 4 },
                ScanEvent::Progress { ordinal: 6 },
            ]
        );
    }

    #[test]
    fn test_unfinished_game_parses_as_draw() {
        let mut scanner = Scanner::new(ScanConfig::default()).unwrap();
        let text = game("x", 2300, 2300, "1. e4 e5 2. Nf3 *");
        run(&mut scanner, &text).unwrap();
        assert_eq!(scanner.counters().records_parsed, 1);
    }

    #[test]
    fn test_crlf_lines_accepted() {
        let mut scanner = Scanner::new(ScanConfig::default()).unwrap();
        let text = game("crlf", 2300, 2300, MATE).replace('\n', "\r\n");
        let mut events = Vec::new();
        for line in text.split('\n') {
            events.extend(scanner.push_line(line).unwrap());
        }
        assert_eq!(matches(&events).len(), 1);
        assert_eq!(matches(&events)[0].site, "crlf");
    }

    #[test]
    fn test_missing_site_reported_as_unknown() {
        let mut scanner = Scanner::new(ScanConfig::default()).unwrap();
        let text = format!("[WhiteElo \"2300\"]\n[BlackElo \"2300\"]\n\n{MATE}\n\n");
        let events = run(&mut scanner, &text).unwrap();
        assert_eq!(matches(&events)[0].site, "?");
    }

    #[test]
    fn test_full_movetext_mode_still_detects() {
        let config = ScanConfig {
            truncate_movetext: false,
            ..Default::default()
        };
        let mut scanner = Scanner::new(config).unwrap();
        let text = game("full", 2300, 2300, MATE);
        let events = run(&mut scanner, &text).unwrap();
        assert_eq!(matches(&events).len(), 1);
    }
}
