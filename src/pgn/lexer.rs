// Character classes and token parsers of the PGN grammar

use chumsky::error::Error;
use chumsky::prelude::*;
use chumsky::stream::Stream;
use std::ops::Range;

use super::{Move, MoveKind, Outcome};
use crate::error::{Expected, LexError};

/// Byte range in the text being parsed
pub type Span = Range<usize>;

/// Failure threaded through the chumsky parsers.
///
/// Keeps the label of the innermost labelled parser that failed; chumsky
/// already keeps the failure that got furthest into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError {
    position: usize,
    expected: Option<Expected>,
}

impl TokenError {
    pub fn at(position: usize, expected: Expected) -> Self {
        Self {
            position,
            expected: Some(expected),
        }
    }

    fn rank(&self) -> u8 {
        match self.expected {
            None => 0,
            Some(Expected::Result) => 3,
            Some(Expected::EndOfInput) => 2,
            Some(_) => 1,
        }
    }
}

impl Error<char> for TokenError {
    type Span = Span;
    type Label = Expected;

    fn expected_input_found<Iter: IntoIterator<Item = Option<char>>>(
        span: Span,
        expected: Iter,
        _found: Option<char>,
    ) -> Self {
        // Only `end()` expects the end of input
        let wants_end = expected.into_iter().any(|token| token.is_none());
        Self {
            position: span.start,
            expected: wants_end.then_some(Expected::EndOfInput),
        }
    }

    fn with_label(mut self, label: Expected) -> Self {
        self.expected.get_or_insert(label);
        self
    }

    // Both failures sit at the same offset. Ties report the missing result, not another turn.
    fn merge(self, other: Self) -> Self {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl From<TokenError> for LexError {
    fn from(err: TokenError) -> Self {
        LexError::new(err.expected.unwrap_or(Expected::EndOfInput), err.position)
    }
}

/// Chars of `source` from byte `offset` on, each spanned by its byte range
pub(crate) fn char_stream(
    source: &str,
    offset: usize,
) -> Stream<'_, char, Span, impl Iterator<Item = (char, Span)> + '_> {
    let end = source.len();
    let chars = source[offset..]
        .char_indices()
        .map(move |(idx, ch)| (ch, offset + idx..offset + idx + ch.len_utf8()));
    Stream::from_iter(end..end, chars)
}

/// Run `parser` over `source` starting at byte `offset`
pub(crate) fn run<O>(
    parser: impl Parser<char, O, Error = TokenError>,
    source: &str,
    offset: usize,
) -> Result<O, LexError> {
    parser.parse(char_stream(source, offset)).map_err(|errors| {
        errors
            .into_iter()
            .next()
            .map(LexError::from)
            .unwrap_or_else(|| LexError::new(Expected::EndOfInput, source.len()))
    })
}

/// Tag key characters: printable ASCII without space, `"`, `[`, `\` and `]`
pub fn is_tag_char(ch: char) -> bool {
    matches!(ch, '\u{21}' | '\u{23}'..='\u{5A}' | '\u{5E}'..='\u{7E}')
}

/// Quoted string characters: anything printable from U+0020 up, except `"`
pub fn is_string_char(ch: char) -> bool {
    ch >= '\u{20}' && ch != '"'
}

/// Characters of a regular SAN move
pub fn is_san_char(ch: char) -> bool {
    matches!(
        ch,
        'a'..='h' | '1'..='8' | 'N' | 'B' | 'R' | 'Q' | 'K' | 'x' | '+' | '#' | '='
    )
}

/// One or more chars of a class, as a slice of `source`
fn run_of<'a>(
    source: &'a str,
    class: fn(char) -> bool,
) -> impl Parser<char, &'a str, Error = TokenError> + Clone + 'a {
    filter(move |ch: &char| class(*ch))
        .ignored()
        .repeated()
        .at_least(1)
        .map_with_span(move |_, span: Span| -> &'a str { &source[span] })
}

pub(crate) fn tag<'a>(source: &'a str) -> impl Parser<char, &'a str, Error = TokenError> + Clone + 'a {
    run_of(source, is_tag_char).labelled(Expected::Tag)
}

/// Content between the quotes of a tag value
pub(crate) fn quoted_string<'a>(
    source: &'a str,
) -> impl Parser<char, &'a str, Error = TokenError> + Clone + 'a {
    run_of(source, is_string_char).labelled(Expected::QuotedString)
}

fn castle<'a>(
    source: &'a str,
    body: &'static str,
    kind: MoveKind,
) -> impl Parser<char, Move<'a>, Error = TokenError> + Clone + 'a {
    just(body)
        .then(one_of("+#").or_not())
        .map_with_span(move |_, span: Span| Move::new(kind, &source[span]))
}

/// One ply. Long castle is tried before short castle, whose text is its prefix.
pub(crate) fn san_move<'a>(
    source: &'a str,
) -> impl Parser<char, Move<'a>, Error = TokenError> + Clone + 'a {
    let regular = run_of(source, is_san_char).map(|san| Move::new(MoveKind::Regular, san));
    let null = just("--").map_with_span(move |_, span: Span| Move::new(MoveKind::Null, &source[span]));

    choice((
        castle(source, "O-O-O", MoveKind::LongCastle),
        castle(source, "O-O", MoveKind::ShortCastle),
        regular,
        null,
    ))
    .labelled(Expected::Move)
}

/// Game termination marker; the unfinished marker `*` is not accepted
pub(crate) fn outcome() -> impl Parser<char, Outcome, Error = TokenError> + Clone {
    choice((
        just("1/2-1/2").to(Outcome::Draw),
        just("1-0").to(Outcome::WhiteWins),
        just("0-1").to(Outcome::BlackWins),
    ))
    .labelled(Expected::Result)
}

/// Longest match of `parser` at the start of `input`, and the text after it
fn classify<'a, O>(
    input: &'a str,
    parser: impl Parser<char, O, Error = TokenError>,
) -> Result<(O, &'a str), LexError> {
    let (value, span) = run(parser.map_with_span(|value, span: Span| (value, span)), input, 0)?;
    Ok((value, &input[span.end..]))
}

pub fn classify_tag(input: &str) -> Result<(&str, &str), LexError> {
    classify(input, tag(input))
}

pub fn classify_string(input: &str) -> Result<(&str, &str), LexError> {
    classify(input, quoted_string(input))
}

pub fn classify_move(input: &str) -> Result<(Move<'_>, &str), LexError> {
    classify(input, san_move(input))
}

pub fn classify_result(input: &str) -> Result<(Outcome, &str), LexError> {
    classify(input, outcome())
}
