// Test fixtures with known PGN records and expected outputs
// WHY: Golden-file testing requires deterministic input/output pairs for validation

#![allow(dead_code)]

/// White pawn on e5 takes f5 en passant with mate; clocks as lichess exports them
pub const WHITE_EP_MATE: &str = "1. e4 { [%clk 0:03:00] } 1... e6 { [%clk 0:03:00] } 2. d4 { [%clk 0:02:58] } 2... d5 { [%clk 0:02:57] } 3. e5 { [%clk 0:02:55] } 3... c5 { [%clk 0:02:50] } 4. Kd2 { [%clk 0:02:40] } 4... f5 { [%clk 0:02:31] } 5. exf6# { [%clk 0:02:29] } 1-0";

/// Black pawn on d4 takes e3 en passant with mate, with eval comments and quality marks
pub const BLACK_EP_MATE: &str = "1. Nf3 { [%eval 0.2] } 1... d5 { [%eval 0.25] } 2. g3 { [%eval 0.1] } 2... d4!? { [%eval 0.3] } 3. Bg2 { [%eval 0.2] } 3... Qd6 { [%eval 0.4] } 4. e4?? { [%eval -99] } 4... dxe3# 0-1";

/// A drawn game with nothing interesting at the end
pub const QUIET_DRAW: &str = "1. d4 d5 2. c4 c6 3. Nc3 Nf6 4. Nf3 dxc4 1/2-1/2";

/// King capture giving mate right after a pawn capture: not en passant
pub const KING_MATE_AFTER_CAPTURE: &str = "43. Kd3 Ke6 44. exd5 { [%clk 0:00:41] } 44... Kxd5# { [%clk 0:00:40] } 0-1";

/// An unfinished game; the marker is read as a draw
pub const UNFINISHED: &str = "1. e4 e5 2. Nf3 *";

/// A variation in the movetext, which the grammar does not accept
pub const WITH_VARIATION: &str = "1. e4 e5 2. Nf3 (2. Nc3 Nc6) 2... Nc6 1-0";

/// Build one lichess-style record with the given site, ratings and movetext
pub fn pgn_record(site: &str, white_elo: &str, black_elo: &str, movetext: &str) -> String {
    format!(
        "[Event \"Rated Blitz game\"]\n\
         [Site \"{site}\"]\n\
         [White \"player_w\"]\n\
         [Black \"player_b\"]\n\
         [Result \"*\"]\n\
         [WhiteElo \"{white_elo}\"]\n\
         [BlackElo \"{black_elo}\"]\n\
         [TimeControl \"180+0\"]\n\
         \n\
         {movetext}\n\
         \n"
    )
}

pub const SITE_WHITE_EP: &str = "https://lichess.org/aB3xY9zQ";
pub const SITE_BLACK_EP: &str = "https://lichess.org/Qz8pLm2K";

/// Expected table rows (after the start progress line) for [`mixed_stream`]
pub const MIXED_TABLE_EXPECTED: &str = r#"|  1 |          1 | https://lichess.org/aB3xY9zQ | exf6# | 2400 - 2250 |
|  2 |          5 | https://lichess.org/Qz8pLm2K | dxe3# | 2600 - 2500 |"#;

/// Six records: two strong en passant mates, a weak one, a quiet draw, an
/// unrated game and a king mate.
pub fn mixed_stream() -> String {
    [
        pgn_record(SITE_WHITE_EP, "2250", "2400", WHITE_EP_MATE),
        pgn_record("https://lichess.org/quiet001", "2301", "2450", QUIET_DRAW),
        pgn_record("https://lichess.org/weak0001", "1800", "2400", WHITE_EP_MATE),
        pgn_record("https://lichess.org/unrated1", "?", "2400", BLACK_EP_MATE),
        pgn_record(SITE_BLACK_EP, "2500", "2600", BLACK_EP_MATE),
        pgn_record("https://lichess.org/kingmate", "2250", "2400", KING_MATE_AFTER_CAPTURE),
    ]
    .concat()
}
