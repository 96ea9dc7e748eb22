use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::models::{CatalogEntry, ChapterEntry};
use crate::error::AppError;

/// Sentinel display number for entries without a number node.
pub const NO_NUMBER: &str = "N/A";

/// Structural fingerprints of the table-of-contents page.
struct Selectors {
    /// Chapter anchor.
    entry: Selector,
    /// Nested display-number node.
    number: Selector,
    /// Lock icon marking a paywalled chapter.
    lock: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    entry: Selector::parse("a.c_000.db.pr.clearfix.pt8.pb8.pr8.pl8[href]").unwrap(),
    number: Selector::parse("i.fl.fs16.lh24.c_l._num.mr4.tal").unwrap(),
    lock: Selector::parse("svg.fr._icon.ml16.mt4.c_s.fs16").unwrap(),
});

/// Extracts every chapter entry from the table-of-contents markup, in
/// document order, with its locked state. A pure read: the markup tree
/// is never mutated as a filtering mechanism.
pub fn parse_catalog(html: &str) -> Result<Vec<CatalogEntry>, AppError> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    for anchor in document.select(&SELECTORS.entry) {
        let title = anchor
            .value()
            .attr("title")
            .ok_or_else(|| {
                AppError::Structure("catalog entry without a title attribute".to_string())
            })?
            .to_string();

        // The entry selector requires [href], so this is always present.
        let href = anchor.value().attr("href").unwrap_or_default();

        let number = anchor
            .select(&SELECTORS.number)
            .next()
            .map(|node| node.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| NO_NUMBER.to_string());

        let locked = anchor.select(&SELECTORS.lock).next().is_some();

        entries.push(CatalogEntry {
            number,
            title,
            url: normalize_locator(href),
            locked,
        });
    }

    Ok(entries)
}

/// Drops locked entries and assigns 1-based sequence indices in the
/// surviving entries' original relative order.
pub fn unlocked_chapters(entries: Vec<CatalogEntry>) -> Vec<ChapterEntry> {
    entries
        .into_iter()
        .filter(|entry| !entry.locked)
        .enumerate()
        .map(|(i, entry)| ChapterEntry {
            index: i + 1,
            number: entry.number,
            title: entry.title,
            url: entry.url,
        })
        .collect()
}

/// Chapter hrefs come scheme-relative ("//www...."); normalize them to
/// secure transport.
fn normalize_locator(href: &str) -> String {
    if let Some(rest) = href.strip_prefix("https://") {
        format!("https://{rest}")
    } else if let Some(rest) = href.strip_prefix("http://") {
        format!("https://{rest}")
    } else {
        format!("https://{}", href.trim_start_matches('/'))
    }
}
