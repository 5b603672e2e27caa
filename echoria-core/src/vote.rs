//! Vote records and submission validation.

use serde::{Deserialize, Serialize};

use crate::catalog::NominationCatalog;
use crate::error::ValidationError;
use crate::Timestamp;

/// Longest accepted candidate name, in characters.
pub const MAX_CHOICE_CHARS: usize = 100;

/// A validated vote that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVote {
    pub voter_id: String,
    pub nomination: String,
    pub choice: String,
}

impl NewVote {
    /// Validate raw submission fields against the catalog.
    ///
    /// The choice is trimmed; everything else must match exactly.
    pub fn validate(
        catalog: &NominationCatalog,
        voter_id: &str,
        nomination: &str,
        choice: &str,
    ) -> Result<Self, ValidationError> {
        if voter_id.trim().is_empty() {
            return Err(ValidationError::missing("voter_id"));
        }
        if nomination.trim().is_empty() {
            return Err(ValidationError::missing("nomination"));
        }
        if !catalog.contains(nomination) {
            return Err(ValidationError::UnknownNomination {
                nomination: nomination.to_string(),
            });
        }

        let choice = choice.trim();
        if choice.is_empty() {
            return Err(ValidationError::missing("choice"));
        }
        if choice.chars().count() > MAX_CHOICE_CHARS {
            return Err(ValidationError::ChoiceTooLong {
                max: MAX_CHOICE_CHARS,
            });
        }
        if choice.chars().any(char::is_control) {
            return Err(ValidationError::InvalidValue {
                field: "choice".to_string(),
                reason: "control characters are not allowed".to_string(),
            });
        }

        Ok(Self {
            voter_id: voter_id.to_string(),
            nomination: nomination.to_string(),
            choice: choice.to_string(),
        })
    }
}

/// A stored vote. Never updated; only removed by a full reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub voter_id: String,
    pub nomination: String,
    pub choice: String,
    pub created_at: Timestamp,
}

/// Result of an insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded(Vote),
    /// The voter already has a vote in this nomination; nothing was written.
    Duplicate,
}

impl VoteOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, VoteOutcome::Duplicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> NominationCatalog {
        NominationCatalog::new(["A", "B"]).expect("static catalog")
    }

    #[test]
    fn test_validate_accepts_and_trims_choice() {
        let vote = NewVote::validate(&catalog(), "u1", "A", "  Alice  ");
        assert_eq!(
            vote,
            Ok(NewVote {
                voter_id: "u1".to_string(),
                nomination: "A".to_string(),
                choice: "Alice".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_unknown_nomination() {
        let err = NewVote::validate(&catalog(), "u1", "Z", "x");
        assert_eq!(
            err,
            Err(ValidationError::UnknownNomination {
                nomination: "Z".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert_eq!(
            NewVote::validate(&catalog(), " ", "A", "x"),
            Err(ValidationError::missing("voter_id"))
        );
        assert_eq!(
            NewVote::validate(&catalog(), "u1", "", "x"),
            Err(ValidationError::missing("nomination"))
        );
        assert_eq!(
            NewVote::validate(&catalog(), "u1", "A", "   "),
            Err(ValidationError::missing("choice"))
        );
    }

    #[test]
    fn test_validate_rejects_long_and_control_choices() {
        let long = "я".repeat(MAX_CHOICE_CHARS + 1);
        assert_eq!(
            NewVote::validate(&catalog(), "u1", "A", &long),
            Err(ValidationError::ChoiceTooLong {
                max: MAX_CHOICE_CHARS
            })
        );

        let exact = "я".repeat(MAX_CHOICE_CHARS);
        assert!(NewVote::validate(&catalog(), "u1", "A", &exact).is_ok());

        assert!(matches!(
            NewVote::validate(&catalog(), "u1", "A", "a\u{0007}b"),
            Err(ValidationError::InvalidValue { .. })
        ));
    }
}
