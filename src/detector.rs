// WHY: recognizes en passant mate from SAN text alone; no board is ever built

use smallvec::SmallVec;

use crate::pgn::Record;

/// Leading characters of non-pawn moves (`O` covers castling)
const PIECE_LETTERS: &[char] = &['B', 'K', 'N', 'O', 'Q', 'R'];

/// Destination rank before and after an en passant capture, for White then Black
const EN_PASSANT_RANKS: [(char, char); 2] = [('5', '6'), ('4', '3')];

/// Final two plies of a game that ended with an en passant checkmate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection<'a> {
    /// Number of the last turn as written in the movetext
    pub move_number: u32,
    /// The double-step pawn move that allowed the capture
    pub previous_move: &'a str,
    /// The capturing, mating move
    pub mating_move: &'a str,
}

pub fn is_pawn_move(san: &str) -> bool {
    match san.chars().next() {
        Some(first) => !PIECE_LETTERS.contains(&first) && !san.contains('='),
        None => false,
    }
}

pub fn is_capture(san: &str) -> bool {
    san.contains('x')
}

pub fn is_checkmate(san: &str) -> bool {
    san.ends_with('#')
}

/// Destination square: check/mate markers dropped, then everything after the last `x`
pub fn destination_square(san: &str) -> String {
    let bare: String = san.chars().filter(|&c| c != '+' && c != '#').collect();
    match bare.rsplit_once('x') {
        Some((_, square)) => square.to_string(),
        None => bare,
    }
}

/// Same file, and ranks moving 5→6 (White captures) or 4→3 (Black captures)
pub fn is_en_passant_transition(previous: &str, last: &str) -> bool {
    let mut previous = previous.chars();
    let mut last = last.chars();
    let (Some(prev_file), Some(prev_rank), None) = (previous.next(), previous.next(), previous.next())
    else {
        return false;
    };
    let (Some(last_file), Some(last_rank), None) = (last.next(), last.next(), last.next()) else {
        return false;
    };
    prev_file == last_file && EN_PASSANT_RANKS.contains(&(prev_rank, last_rank))
}

/// Check whether the game's last two plies are a pawn double step answered by
/// an en passant capture that mates.
///
/// Needs at least two turns; anything else is silently not a match.
pub fn detect<'a>(record: &Record<'a>) -> Option<Detection<'a>> {
    let [.., previous_turn, last_turn] = record.game.turns.as_slice() else {
        return None;
    };

    let plies: SmallVec<[&'a str; 4]> = previous_turn
        .plies()
        .chain(last_turn.plies())
        .map(|m| m.san)
        .collect();
    let [.., previous, last] = plies.as_slice() else {
        return None;
    };
    let (previous, last) = (*previous, *last);

    let shape_matches = is_pawn_move(previous)
        && is_pawn_move(last)
        && !is_capture(previous)
        && is_capture(last)
        && is_checkmate(last);
    if !shape_matches {
        return None;
    }

    if !is_en_passant_transition(&destination_square(previous), &destination_square(last)) {
        return None;
    }

    Some(Detection {
        move_number: last_turn.number,
        previous_move: previous,
        mating_move: last,
    })
}
