//! Interaction identifiers.
//!
//! Buttons carry an opaque `custom_id`. They are decoded once, at the
//! boundary, into a tagged variant:
//!
//! ```text
//! lb_prev_3            -> Navigate { Previous, page: 3 }
//! lb_next_4            -> Navigate { Next, page: 4 }
//! reset_votes          -> ResetVotes { issued_at: None }
//! reset_votes:17000000 -> ResetVotes { issued_at: Some(17000000) }
//! ```

use std::fmt;

/// Identifier of the reset confirmation button.
pub const RESET_VOTES_ID: &str = "reset_votes";

const NAV_PREFIX: &str = "lb_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Previous => "prev",
            Direction::Next => "next",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "prev" => Some(Direction::Previous),
            "next" => Some(Direction::Next),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionId {
    /// Show `page` (0-based target page, not a delta).
    Navigate { direction: Direction, page: usize },
    /// Confirm a full vote reset. `issued_at` is the prompt's Unix time.
    ResetVotes { issued_at: Option<i64> },
    /// Looked like one of ours but did not parse.
    Malformed { raw: String },
    /// Belongs to somebody else.
    Unknown { raw: String },
}

impl InteractionId {
    pub fn navigate(direction: Direction, page: usize) -> Self {
        Self::Navigate { direction, page }
    }

    pub fn reset_votes_at(issued_at: i64) -> Self {
        Self::ResetVotes {
            issued_at: Some(issued_at),
        }
    }

    pub fn decode(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix(RESET_VOTES_ID) {
            if rest.is_empty() {
                return Self::ResetVotes { issued_at: None };
            }
            return match rest.strip_prefix(':').map(str::parse::<i64>) {
                Some(Ok(ts)) => Self::ResetVotes {
                    issued_at: Some(ts),
                },
                _ => Self::Malformed {
                    raw: raw.to_string(),
                },
            };
        }

        if let Some(rest) = raw.strip_prefix(NAV_PREFIX) {
            let parsed = rest.split_once('_').and_then(|(dir, page)| {
                let direction = Direction::parse(dir)?;
                let page = page.parse::<usize>().ok()?;
                Some(Self::Navigate { direction, page })
            });
            return parsed.unwrap_or_else(|| Self::Malformed {
                raw: raw.to_string(),
            });
        }

        Self::Unknown {
            raw: raw.to_string(),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Navigate { direction, page } => format!("{NAV_PREFIX}{direction}_{page}"),
            Self::ResetVotes { issued_at: None } => RESET_VOTES_ID.to_string(),
            Self::ResetVotes {
                issued_at: Some(ts),
            } => format!("{RESET_VOTES_ID}:{ts}"),
            Self::Malformed { raw } | Self::Unknown { raw } => raw.clone(),
        }
    }
}
