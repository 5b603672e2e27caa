//! Leaderboard rendering.
//!
//! `render` is a pure function from a page index and that page's tally to
//! the payload shown in chat. The footer doubles as the only persisted copy
//! of the current page, so `format_footer` and `parse_footer` must stay in
//! lockstep.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::NominationCatalog;
use crate::interaction::{Direction, InteractionId};
use crate::tally::TallyEntry;

/// Text shown for a nomination nobody has voted in yet.
pub const NO_VOTES_PLACEHOLDER: &str = "Пока нет голосов";

/// How many ranked entries a page shows.
pub const TOP_ENTRIES: usize = 3;

/// Embed accent colour (gold).
pub const LEADERBOARD_COLOR: u32 = 0xF1C40F;

static FOOTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*Page\s+(\d+)\s+of\s+(\d+)\s*$").expect("footer regex is valid")
});

/// A previous/next control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavButton {
    pub custom_id: String,
    pub label: String,
    pub disabled: bool,
}

/// Everything needed to draw one leaderboard page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardPayload {
    pub page_index: usize,
    pub title: String,
    pub lines: Vec<String>,
    pub footer: String,
    pub color: u32,
    pub previous: NavButton,
    pub next: NavButton,
}

impl LeaderboardPayload {
    pub fn description(&self) -> String {
        self.lines.join("\n")
    }
}

fn rank_marker(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("#{n}"),
    }
}

fn entry_line(rank: usize, entry: &TallyEntry) -> String {
    format!("{} {} — {} голосов", rank_marker(rank), entry.choice, entry.votes)
}

/// `Page {n} of {total}` with a 1-based `n`.
pub fn format_footer(page_index: usize, total: usize) -> String {
    format!("Page {} of {}", page_index + 1, total)
}

/// Parse a footer back into a 0-based page index.
///
/// Returns `None` for anything `format_footer` could not have produced,
/// including `Page 0 of N` and pages past the total.
pub fn parse_footer(footer: &str) -> Option<usize> {
    let caps = FOOTER_RE.captures(footer)?;
    let page: usize = caps.get(1)?.as_str().parse().ok()?;
    let total: usize = caps.get(2)?.as_str().parse().ok()?;
    if page == 0 || page > total {
        return None;
    }
    Some(page - 1)
}

/// Cold-start page recovery: parse a footer if there is one and clamp it to
/// the current catalog, defaulting to the first page.
pub fn recover_page_index(catalog: &NominationCatalog, footer: Option<&str>) -> usize {
    footer
        .and_then(parse_footer)
        .map(|page| catalog.clamp_page(page))
        .unwrap_or(0)
}

/// Render one page. `page_index` is clamped to the catalog first.
pub fn render(
    catalog: &NominationCatalog,
    page_index: usize,
    entries: &[TallyEntry],
) -> LeaderboardPayload {
    let page_index = catalog.clamp_page(page_index);
    let last = catalog.last_index();

    let lines = if entries.is_empty() {
        vec![NO_VOTES_PLACEHOLDER.to_string()]
    } else {
        entries
            .iter()
            .take(TOP_ENTRIES)
            .enumerate()
            .map(|(i, entry)| entry_line(i + 1, entry))
            .collect()
    };

    let previous = NavButton {
        custom_id: InteractionId::navigate(Direction::Previous, page_index.saturating_sub(1))
            .encode(),
        label: "◀".to_string(),
        disabled: page_index == 0,
    };
    let next = NavButton {
        custom_id: InteractionId::navigate(Direction::Next, (page_index + 1).min(last)).encode(),
        label: "▶".to_string(),
        disabled: page_index == last,
    };

    LeaderboardPayload {
        page_index,
        title: format!("🏆 {}", catalog.nomination_at(page_index)),
        lines,
        footer: format_footer(page_index, catalog.len()),
        color: LEADERBOARD_COLOR,
        previous,
        next,
    }
}
