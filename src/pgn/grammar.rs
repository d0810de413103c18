//! PGN grammar built from the token parsers.
//!
//! ```text
//! annotation  := "[" tag " " '"' string '"' "]"
//! annotations := annotation ("\n" annotation)*
//! turn        := number "." ws move ws (move ws)?
//! game        := turn* outcome
//! entry       := annotations ws* game ws*
//! pgn         := entry*
//! ```
//!
//! Move numbers are taken as written; nothing checks that they are contiguous.

use chumsky::prelude::*;

use super::lexer::{outcome, quoted_string, run, san_move, tag, Span, TokenError};
use super::{Annotations, Game, Record, Turn};
use crate::error::{Expected, ParseError};

fn literal(text: &'static str) -> impl Parser<char, &'static str, Error = TokenError> + Clone {
    just(text).labelled(Expected::Literal(text))
}

fn whitespace() -> impl Parser<char, char, Error = TokenError> + Clone {
    one_of(" \n").labelled(Expected::Whitespace)
}

/// `[Key "Value"]`; an empty value is accepted
fn annotation<'a>(
    source: &'a str,
) -> impl Parser<char, (&'a str, &'a str), Error = TokenError> + Clone + 'a {
    literal("[")
        .ignore_then(tag(source))
        .then_ignore(literal(" "))
        .then_ignore(literal("\""))
        .then(quoted_string(source).or_not())
        .then_ignore(literal("\""))
        .then_ignore(literal("]"))
        .map(|(key, value)| (key, value.unwrap_or("")))
}

/// Newline-separated tag pairs; a repeated key keeps the last value
fn annotations<'a>(
    source: &'a str,
) -> impl Parser<char, Annotations<'a>, Error = TokenError> + Clone + 'a {
    annotation(source)
        .then(literal("\n").ignore_then(annotation(source)).repeated())
        .or_not()
        .map(|pairs| {
            pairs
                .into_iter()
                .flat_map(|(first, rest)| std::iter::once(first).chain(rest))
                .collect::<Annotations<'a>>()
        })
}

fn move_number<'a>(source: &'a str) -> impl Parser<char, u32, Error = TokenError> + Clone + 'a {
    filter(char::is_ascii_digit)
        .ignored()
        .repeated()
        .at_least(1)
        .try_map(move |_, span: Span| {
            source[span.clone()]
                .parse::<u32>()
                .map_err(|_| TokenError::at(span.start, Expected::MoveNumber))
        })
        .labelled(Expected::MoveNumber)
}

fn turn<'a>(source: &'a str) -> impl Parser<char, Turn<'a>, Error = TokenError> + Clone + 'a {
    move_number(source)
        .then_ignore(literal("."))
        .then_ignore(whitespace())
        .then(san_move(source))
        .then_ignore(whitespace())
        .then(san_move(source).then_ignore(whitespace()).or_not())
        .map(|((number, white), black)| Turn {
            number,
            white,
            black,
        })
}

fn game<'a>(source: &'a str) -> impl Parser<char, Game<'a>, Error = TokenError> + Clone + 'a {
    turn(source)
        .repeated()
        .then(outcome())
        .map(|(turns, outcome)| Game {
            turns: turns.into_iter().collect(),
            outcome,
        })
}

fn entry<'a>(source: &'a str) -> impl Parser<char, Record<'a>, Error = TokenError> + Clone + 'a {
    annotations(source)
        .then_ignore(whitespace().repeated())
        .then(game(source))
        .then_ignore(whitespace().repeated())
        .map(|(annotations, game)| Record { annotations, game })
}

/// Parse a text block holding exactly one entry.
///
/// `ordinal` is the record's position in the input stream and is carried by
/// the error so the caller can name the malformed record.
pub fn parse_entry(text: &str, ordinal: u64) -> Result<Record<'_>, ParseError> {
    run(entry(text).then_ignore(end()), text, 0)
        .map_err(|err| ParseError::locate(text, ordinal, err))
}

/// Parse zero or more entries.
///
/// On failure the error ordinal is the 1-based index of the entry that did not parse.
pub fn parse_pgn(text: &str) -> Result<Vec<Record<'_>>, ParseError> {
    let parser = entry(text).map_with_span(|record, span: Span| (record, span.end));
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let ordinal = records.len() as u64 + 1;
        let (record, end) = run(parser.clone(), text, offset)
            .map_err(|err| ParseError::locate(text, ordinal, err))?;
        records.push(record);
        offset = end;
    }
    Ok(records)
}
