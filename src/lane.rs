//! Lane identity and the status value a lane displays.

use std::fmt;

/// Identifies one row of the board.
///
/// Monitored lines are numbered in config order; the news ticker has its own
/// reserved key so it can never collide with a line index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LaneKey {
    Line(usize),
    News,
}

impl LaneKey {
    pub fn is_news(self) -> bool {
        matches!(self, LaneKey::News)
    }
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKey::Line(index) => write!(f, "line#{index}"),
            LaneKey::News => f.write_str("news"),
        }
    }
}

/// Resolved status for one monitored line, as handed over by a status source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneStatus {
    pub is_alert: bool,
    pub text: String,
}

impl LaneStatus {
    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            is_alert: false,
            text: text.into(),
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            is_alert: true,
            text: text.into(),
        }
    }
}

/// Collapse embedded line breaks to spaces and trim, so every message renders
/// on a single line.
pub fn single_line(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                // CRLF counts as one break
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            other => out.push(other),
        }
    }
    out.trim().to_string()
}
