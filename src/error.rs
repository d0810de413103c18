// WHY: structured failures for the PGN pipeline; I/O and CLI plumbing stays on anyhow

use std::fmt;
use thiserror::Error;

/// Token class a recognizer was looking for when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Tag,
    QuotedString,
    Move,
    Result,
    MoveNumber,
    Literal(&'static str),
    Whitespace,
    EndOfInput,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Tag => f.write_str("tag"),
            Expected::QuotedString => f.write_str("quoted string"),
            Expected::Move => f.write_str("move"),
            Expected::Result => f.write_str("result"),
            Expected::MoveNumber => f.write_str("move number"),
            Expected::Literal(lit) => write!(f, "{lit:?}"),
            Expected::Whitespace => f.write_str("whitespace"),
            Expected::EndOfInput => f.write_str("end of input"),
        }
    }
}

/// Unrecognized token at a byte offset (0-based) of the parsed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} at byte {position}")]
pub struct LexError {
    pub expected: Expected,
    pub position: usize,
}

impl LexError {
    pub fn new(expected: Expected, position: usize) -> Self {
        Self { expected, position }
    }
}

/// No grammar alternative matched a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record {ordinal} is malformed at line {line}, column {column}: {source}")]
pub struct ParseError {
    /// 1-based ordinal of the record in the input stream
    pub ordinal: u64,
    pub line: usize,
    pub column: usize,
    #[source]
    pub source: LexError,
}

impl ParseError {
    /// Locate a lexical failure inside `text` and tag it with the record ordinal
    pub fn locate(text: &str, ordinal: u64, source: LexError) -> Self {
        let position = source.position.min(text.len());
        let prefix = text.get(..position).unwrap_or(text);
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
        let column = prefix[line_start..].chars().count() + 1;

        Self {
            ordinal,
            line,
            column,
            source,
        }
    }
}

/// Rating tag whose value is not an integer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rating value {value:?} is not an integer")]
pub struct RatingParseError {
    pub value: String,
}
