// WHY: borrowed record model; a parsed record never outlives the text block it was parsed from

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

pub mod grammar;
pub mod lexer;
pub mod normalization;

pub use grammar::{parse_entry, parse_pgn};
pub use lexer::{classify_move, classify_result, classify_string, classify_tag};
pub use normalization::MovetextNormalizer;

/// Tag key to tag value. A later duplicate key overwrites the earlier value.
pub type Annotations<'a> = BTreeMap<&'a str, &'a str>;

/// Turns of a game; the truncated movetext the scanner parses rarely exceeds four
pub type TurnList<'a> = SmallVec<[Turn<'a>; 4]>;

/// Tag holding the game's site identifier
pub const SITE_TAG: &str = "Site";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Piece/file/rank/capture/check/mate characters
    Regular,
    ShortCastle,
    LongCastle,
    /// `--` placeholder some transcripts emit for an illegal move
    Null,
}

/// One ply as it appeared in the movetext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move<'a> {
    pub kind: MoveKind,
    pub san: &'a str,
}

impl<'a> Move<'a> {
    pub fn new(kind: MoveKind, san: &'a str) -> Self {
        Self { kind, san }
    }
}

impl fmt::Display for Move<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.san)
    }
}

/// A numbered turn: White's ply, then Black's ply unless the game ended mid-turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn<'a> {
    pub number: u32,
    pub white: Move<'a>,
    pub black: Option<Move<'a>>,
}

impl<'a> Turn<'a> {
    /// Plies of this turn in playing order
    pub fn plies(&self) -> impl Iterator<Item = Move<'a>> {
        std::iter::once(self.white).chain(self.black)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl Outcome {
    /// Marker for an unfinished game; the grammar has no production for it
    pub const UNFINISHED: &'static str = "*";

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::WhiteWins => "1-0",
            Outcome::BlackWins => "0-1",
            Outcome::Draw => "1/2-1/2",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game<'a> {
    pub turns: TurnList<'a>,
    pub outcome: Outcome,
}

/// Tag section plus movetext of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub annotations: Annotations<'a>,
    pub game: Game<'a>,
}

impl<'a> Record<'a> {
    pub fn annotation(&self, key: &str) -> Option<&'a str> {
        self.annotations.get(key).copied()
    }

    pub fn site(&self) -> Option<&'a str> {
        self.annotation(SITE_TAG)
    }
}

/// Minimal textual form; parses back to an equal record
impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.annotations {
            writeln!(f, "[{key} \"{value}\"]")?;
        }
        writeln!(f)?;
        for turn in &self.game.turns {
            write!(f, "{}. {} ", turn.number, turn.white)?;
            if let Some(black) = turn.black {
                write!(f, "{black} ")?;
            }
        }
        writeln!(f, "{}", self.game.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> Record<'static> {
        let mut annotations = Annotations::new();
        annotations.insert("Site", "https://lichess.org/abcd1234");
        annotations.insert("White", "Anna Müller");

        let mut turns = TurnList::new();
        turns.push(Turn {
            number: 1,
            white: Move::new(MoveKind::Regular, "e4"),
            black: Some(Move::new(MoveKind::Regular, "e5")),
        });
        turns.push(Turn {
            number: 2,
            white: Move::new(MoveKind::ShortCastle, "O-O"),
            black: None,
        });

        Record {
            annotations,
            game: Game {
                turns,
                outcome: Outcome::WhiteWins,
            },
        }
    }

    #[test]
    fn test_turn_plies_skip_missing_black_move() {
        let record = sample_record();
        let sans: Vec<&str> = record.game.turns[1].plies().map(|m| m.san).collect();
        assert_eq!(sans, vec!["O-O"]);

        let sans: Vec<&str> = record.game.turns[0].plies().map(|m| m.san).collect();
        assert_eq!(sans, vec!["e4", "e5"]);
    }

    #[test]
    fn test_outcome_literals() {
        assert_eq!(Outcome::WhiteWins.to_string(), "1-0");
        assert_eq!(Outcome::BlackWins.to_string(), "0-1");
        assert_eq!(Outcome::Draw.to_string(), "1/2-1/2");
    }

    #[test]
    fn test_record_display_minimal_form() {
        let record = sample_record();
        let expected = "[Site \"https://lichess.org/abcd1234\"]\n[White \"Anna Müller\"]\n\n1. e4 e5 2. O-O 1-0\n";
        assert_eq!(record.to_string(), expected);
    }

    #[test]
    fn test_site_lookup() {
        let record = sample_record();
        assert_eq!(record.site(), Some("https://lichess.org/abcd1234"));
        assert_eq!(record.annotation("Event"), None);
    }
}
