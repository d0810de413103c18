// WHY: two-phase line state machine that cuts a PGN stream into records without holding more than one

use tracing::debug;

use crate::error::RatingParseError;
use crate::pgn::{MovetextNormalizer, SITE_TAG};

/// Both players must be rated strictly above this to be admitted
pub const DEFAULT_MIN_ELO: u32 = 2200;

const WHITE_ELO_TAG: &str = "WhiteElo";
const BLACK_ELO_TAG: &str = "BlackElo";

/// Blank lines before a record's first header line are skipped, so stray
/// separators between records do not shift the phases. A record with no
/// header lines at all is therefore not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Tag pairs, up to the first blank line
    Header,
    /// Movetext, up to the second blank line
    Movetext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

/// Ratings seen in the current record's header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EloGate {
    pub white: Option<u32>,
    pub black: Option<u32>,
}

impl EloGate {
    pub fn record(&mut self, color: Color, rating: u32) {
        match color {
            Color::White => self.white = Some(rating),
            Color::Black => self.black = Some(rating),
        }
    }

    /// True only when both ratings are known and above `min_elo`
    pub fn admits(&self, min_elo: u32) -> bool {
        matches!((self.white, self.black), (Some(w), Some(b)) if w > min_elo && b > min_elo)
    }

    /// Both ratings, higher first
    pub fn ratings_desc(&self) -> Option<(u32, u32)> {
        let (white, black) = (self.white?, self.black?);
        Some((white.max(black), white.min(black)))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Parse a rating tag value
pub fn parse_rating(value: &str) -> Result<u32, RatingParseError> {
    value.trim().parse::<u32>().map_err(|_| RatingParseError {
        value: value.to_string(),
    })
}

/// Key and value of a `[Key "Value"]` header line, read loosely
fn split_tag_line(line: &str) -> Option<(&str, &str)> {
    let inner = line.trim_start().strip_prefix('[')?;
    let (key, rest) = inner.split_once(' ')?;
    let value = rest.split('"').nth(1)?;
    Some((key, value))
}

/// A record whose both ratings cleared the gate, ready for the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedRecord {
    pub ordinal: u64,
    /// Site tag line, blank separator, normalized movetext
    pub text: String,
    /// Higher rating first
    pub ratings: (u32, u32),
}

/// What the segmenter reports when a record ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Admitted(AdmittedRecord),
    Rejected { ordinal: u64 },
}

impl Segment {
    pub fn ordinal(&self) -> u64 {
        match self {
            Segment::Admitted(record) => record.ordinal,
            Segment::Rejected { ordinal } => *ordinal,
        }
    }
}

/// Line-at-a-time record splitter.
///
/// Starts in [`Phase::Header`]; a blank line moves to [`Phase::Movetext`] and
/// the next blank line ends the record and starts over. Only the site tag and
/// the movetext of admitted records are buffered.
pub struct Segmenter {
    min_elo: u32,
    normalizer: MovetextNormalizer,
    phase: Phase,
    header_seen: bool,
    gate: EloGate,
    buffer: String,
    next_ordinal: u64,
    scratch: String,
}

impl Segmenter {
    pub fn new(min_elo: u32, normalizer: MovetextNormalizer) -> Self {
        Self {
            min_elo,
            normalizer,
            phase: Phase::Header,
            header_seen: false,
            gate: EloGate::default(),
            buffer: String::new(),
            next_ordinal: 1,
            scratch: String::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn gate(&self) -> EloGate {
        self.gate
    }

    /// Ordinal the record currently being read will get (1-based)
    pub fn next_ordinal(&self) -> u64 {
        self.next_ordinal
    }

    /// Records completed so far
    pub fn records_seen(&self) -> u64 {
        self.next_ordinal - 1
    }

    /// True when some lines of an unfinished record have been consumed
    pub fn has_partial_record(&self) -> bool {
        self.phase == Phase::Movetext || self.header_seen
    }

    /// Feed one line (without its terminator). Returns a segment when the line ends a record.
    pub fn push_line(&mut self, line: &str) -> Option<Segment> {
        let blank = line.is_empty();
        match (self.phase, blank) {
            (Phase::Header, false) => {
                self.header_seen = true;
                self.scan_header_line(line);
                None
            }
            (Phase::Header, true) if !self.header_seen => None,
            (Phase::Header, true) => {
                self.buffer.push('\n');
                self.phase = Phase::Movetext;
                None
            }
            (Phase::Movetext, false) => {
                if self.gate.admits(self.min_elo) {
                    self.normalizer.normalize_into(line, &mut self.scratch);
                    self.buffer.push_str(&self.scratch);
                    self.buffer.push('\n');
                }
                None
            }
            (Phase::Movetext, true) => Some(self.finish_record()),
        }
    }

    fn scan_header_line(&mut self, line: &str) {
        let Some((key, value)) = split_tag_line(line) else {
            return;
        };
        let color = match key {
            WHITE_ELO_TAG => Some(Color::White),
            BLACK_ELO_TAG => Some(Color::Black),
            _ => None,
        };
        if let Some(color) = color {
            match parse_rating(value) {
                Ok(rating) => self.gate.record(color, rating),
                Err(err) => debug!(ordinal = self.next_ordinal, %err, "ignoring rating"),
            }
        } else if key == SITE_TAG {
            self.buffer.push_str(line);
            self.buffer.push('\n');
        }
    }

    fn finish_record(&mut self) -> Segment {
        let ordinal = self.next_ordinal;
        let segment = match self.gate.ratings_desc() {
            Some(ratings) if self.gate.admits(self.min_elo) => {
                self.buffer.push('\n');
                Segment::Admitted(AdmittedRecord {
                    ordinal,
                    text: std::mem::take(&mut self.buffer),
                    ratings,
                })
            }
            _ => Segment::Rejected { ordinal },
        };

        self.buffer.clear();
        self.gate.clear();
        self.header_seen = false;
        self.phase = Phase::Header;
        self.next_ordinal += 1;
        segment
    }
}
