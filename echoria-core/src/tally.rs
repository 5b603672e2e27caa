//! Vote tallies.
//!
//! Stores hand back raw `(nomination, choice, count)` groups; this module
//! turns them into ranked lists. Ranking is votes descending, then choice
//! ascending, so ties never flap between renders.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::NominationCatalog;

/// One `GROUP BY nomination, choice` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceCount {
    pub nomination: String,
    pub choice: String,
    pub votes: u64,
}

/// A ranked `(choice, votes)` pair within one nomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub choice: String,
    pub votes: u64,
}

impl TallyEntry {
    pub fn new(choice: impl Into<String>, votes: u64) -> Self {
        Self {
            choice: choice.into(),
            votes,
        }
    }
}

fn ranking_order(a: &TallyEntry, b: &TallyEntry) -> Ordering {
    b.votes
        .cmp(&a.votes)
        .then_with(|| a.choice.cmp(&b.choice))
}

/// Sort entries into leaderboard order.
pub fn rank(mut entries: Vec<TallyEntry>) -> Vec<TallyEntry> {
    entries.sort_by(ranking_order);
    entries
}

/// Ranked tallies for every nomination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standings {
    pub nominations: Vec<NominationStanding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationStanding {
    pub nomination: String,
    pub entries: Vec<TallyEntry>,
}

impl Standings {
    /// Group rows by nomination.
    ///
    /// Every catalog nomination appears in catalog order, empty when nobody
    /// voted. Stored nominations unknown to the catalog follow, by name.
    pub fn from_counts(catalog: &NominationCatalog, counts: Vec<ChoiceCount>) -> Self {
        let mut grouped: BTreeMap<String, Vec<TallyEntry>> = BTreeMap::new();
        for row in counts {
            grouped
                .entry(row.nomination)
                .or_default()
                .push(TallyEntry::new(row.choice, row.votes));
        }

        let mut nominations = Vec::with_capacity(catalog.len() + grouped.len());
        for name in catalog.names() {
            let entries = grouped.remove(name).unwrap_or_default();
            nominations.push(NominationStanding {
                nomination: name.clone(),
                entries: rank(entries),
            });
        }
        for (nomination, entries) in grouped {
            nominations.push(NominationStanding {
                nomination,
                entries: rank(entries),
            });
        }

        Self { nominations }
    }

    pub fn get(&self, nomination: &str) -> Option<&[TallyEntry]> {
        self.nominations
            .iter()
            .find(|s| s.nomination == nomination)
            .map(|s| s.entries.as_slice())
    }

    pub fn total_votes(&self) -> u64 {
        self.nominations
            .iter()
            .flat_map(|s| s.entries.iter())
            .map(|e| e.votes)
            .sum()
    }
}
