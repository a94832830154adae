//! GTP command vocabulary and reply conventions.
//!
//! The arbiter treats move semantics as opaque text. The only protocol
//! knowledge encoded here is the handful of command spellings the target
//! engine accepts, the reply wrapper characters, and the reserved pass
//! marker.

/// Reserved pass marker, compared case-sensitively after trimming.
pub const PASS: &str = "PASS";

/// Termination command. Elicits no framed reply; the engine exits.
pub const QUIT: &str = "quit";

/// Stone color for move generation and application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// Short color name as sent on the wire (`b` / `w`).
    pub fn short(self) -> &'static str {
        match self {
            Color::Black => "b",
            Color::White => "w",
        }
    }

    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short())
    }
}

pub fn genmove(color: Color) -> String {
    format!("genmove {}", color.short())
}

pub fn play(color: Color, vertex: &str) -> String {
    format!("play {} {}", color.short(), vertex)
}

pub fn showboard() -> &'static str {
    "showboard"
}

pub fn final_score() -> &'static str {
    "final_score"
}

pub fn quit() -> &'static str {
    QUIT
}

/// Strip the reply wrapper from a raw response.
///
/// GTP wraps replies with a leading `= ` (or `?` on failure, which we still
/// surface as text) and trailing whitespace; the payload is what remains
/// after removing `=`, spaces, newlines and tabs from both ends.
pub fn trim_reply(raw: &str) -> &str {
    raw.trim_matches(|c| matches!(c, '=' | ' ' | '\n' | '\t'))
}

pub fn is_pass(vertex: &str) -> bool {
    vertex == PASS
}
