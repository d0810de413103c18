// WHY: the grammar only knows bare moves and results, so raw movetext is reduced to that before parsing

use anyhow::Result;
use regex_automata::meta::Regex;

use super::Outcome;

/// Normalized movetext longer than this is cut down to its first and last turns
pub const TRUNCATION_THRESHOLD: usize = 20;

/// Rewrites one raw movetext line into the subset of PGN the grammar accepts.
///
/// Steps, in order:
/// 1. drop `{...}` comments (clock and eval annotations)
/// 2. drop ` N... ` continuation numbers left behind by step 1
/// 3. collapse doubled spaces once
/// 4. drop `?` and `!` move-quality marks
/// 5. keep only the first and the last two `.`-separated fields of long text
/// 6. rewrite a trailing unfinished marker `*` as a draw
pub struct MovetextNormalizer {
    comment: Regex,
    continuation: Regex,
    truncate: bool,
}

impl MovetextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            comment: Regex::new(r"\{[^}]*\}")?,
            continuation: Regex::new(r" [0-9]+\.\.\. ")?,
            truncate: true,
        })
    }

    /// Enable or disable step 5.
    ///
    /// Truncation assumes `.` only ever appears after move numbers; with it
    /// disabled the whole game goes through the parser.
    pub fn with_truncation(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn normalize(&self, movetext: &str) -> String {
        let mut buffer = String::with_capacity(movetext.len());
        self.normalize_into(movetext, &mut buffer);
        buffer
    }

    /// Normalize into a caller-owned buffer, replacing its contents
    pub fn normalize_into(&self, movetext: &str, buffer: &mut String) {
        let without_comments = remove_all(&self.comment, movetext);
        let without_continuations = remove_all(&self.continuation, &without_comments);
        let mut text = without_continuations.replace("  ", " ");
        text.retain(|ch| ch != '?' && ch != '!');

        if self.truncate && text.len() > TRUNCATION_THRESHOLD {
            text = keep_first_and_last_turns(&text);
        }

        buffer.clear();
        let trimmed = text.trim_end();
        match trimmed.strip_suffix(Outcome::UNFINISHED) {
            Some(head) => {
                buffer.push_str(head);
                buffer.push_str(Outcome::Draw.as_str());
            }
            None => buffer.push_str(&text),
        }
    }
}

fn remove_all(pattern: &Regex, text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for found in pattern.find_iter(text) {
        result.push_str(&text[last..found.start()]);
        last = found.end();
    }
    result.push_str(&text[last..]);
    result
}

fn keep_first_and_last_turns(text: &str) -> String {
    let fields: Vec<&str> = text.split('.').collect();
    // WHY: with three fields or fewer there is no interior to discard
    if fields.len() <= 3 {
        return text.to_string();
    }
    let n = fields.len();
    [fields[0], fields[n - 2], fields[n - 1]].join(".")
}
