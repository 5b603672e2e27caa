//! Nomination catalog.
//!
//! The catalog is fixed at process start and defines the leaderboard's page
//! domain: page `i` shows nomination `i`.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::CatalogError;

/// Nominations used when no catalog is configured.
pub const DEFAULT_NOMINATIONS: &[&str] = &[
    "Тролль года",
    "Админ года",
    "Мемолог года",
    "Новичок года",
    "Голос года",
    "Событие года",
];

/// Ordered, immutable list of nomination names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominationCatalog {
    names: Arc<[String]>,
}

impl NominationCatalog {
    /// Build a catalog. Names are trimmed; blanks are dropped.
    ///
    /// # Errors
    /// Returns an error when no names remain or a name repeats.
    pub fn new<I, S>(names: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if !seen.insert(name.to_string()) {
                return Err(CatalogError::Duplicate(name.to_string()));
            }
            ordered.push(name.to_string());
        }

        if ordered.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self {
            names: ordered.into(),
        })
    }

    /// Parse a `|`-separated list, as read from configuration.
    pub fn parse(list: &str) -> Result<Self, CatalogError> {
        Self::new(list.split('|'))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false: construction rejects empty catalogs.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.names.len() - 1
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, nomination: &str) -> bool {
        self.names.iter().any(|n| n == nomination)
    }

    pub fn position(&self, nomination: &str) -> Option<usize> {
        self.names.iter().position(|n| n == nomination)
    }

    /// Clamp a page index into `[0, len - 1]`.
    pub fn clamp_page(&self, page_index: usize) -> usize {
        page_index.min(self.last_index())
    }

    /// Nomination shown on the given page, after clamping.
    pub fn nomination_at(&self, page_index: usize) -> &str {
        &self.names[self.clamp_page(page_index)]
    }
}

impl Default for NominationCatalog {
    fn default() -> Self {
        Self {
            names: DEFAULT_NOMINATIONS
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .into(),
        }
    }
}
