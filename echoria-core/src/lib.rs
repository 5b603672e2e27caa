//! Echoria Core - Domain Types
//!
//! Pure data structures and pure functions shared by every other crate:
//! the nomination catalog, vote validation, tally ranking, the leaderboard
//! renderer and the decoding of interaction identifiers. Nothing in here
//! performs I/O.

pub mod access;
pub mod catalog;
pub mod error;
pub mod interaction;
pub mod leaderboard;
pub mod tally;
pub mod vote;

pub use access::AdminPolicy;
pub use catalog::{NominationCatalog, DEFAULT_NOMINATIONS};
pub use error::{CatalogError, ValidationError};
pub use interaction::{Direction, InteractionId, RESET_VOTES_ID};
pub use leaderboard::{
    format_footer, parse_footer, recover_page_index, render, LeaderboardPayload, NavButton,
    NO_VOTES_PLACEHOLDER,
};
pub use tally::{rank, ChoiceCount, NominationStanding, Standings, TallyEntry};
pub use vote::{NewVote, Vote, VoteOutcome, MAX_CHOICE_CHARS};

/// Timestamp type using UTC timezone.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
