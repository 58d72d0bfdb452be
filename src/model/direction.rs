//! Query direction relative to a breakpoint.

use serde::{Deserialize, Serialize};

/// Which widths a breakpoint entry in a query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// At or above the breakpoint's lower bound.
    Up,
    /// The breakpoint's own span and everything below it.
    Down,
    /// Exactly the breakpoint's span: its lower bound up to the next breakpoint.
    Only,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Only => "only",
        }
    }

    /// Parse a direction keyword. Case-sensitive, as the keywords are.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "only" => Some(Direction::Only),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
