//! HTML parsers for wiki NPC detail pages.

pub mod loot;
pub mod markers;
pub mod stats;

#[cfg(test)]
pub mod fixtures;

use scraper::{ElementRef, Html};

use crate::types::{DropEntry, MobAttributes, RawStatMap, SpoilEntry};

pub use loot::{LootParser, LootSection};
pub use markers::MarkerParser;
pub use stats::StatParser;

/// Collapse newlines, tabs and runs of spaces into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleaned text content of an element.
pub fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}

/// Everything extracted from one detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct MobPage {
    /// `None` when the stats table is absent or holds no known statistic.
    pub stats: Option<RawStatMap>,
    pub drops: Vec<DropEntry>,
    pub spoils: Vec<SpoilEntry>,
    pub attributes: MobAttributes,
}

impl MobPage {
    /// Parse a detail page. `mob_name` comes from the listing and feeds the
    /// treasure-chest marker.
    pub fn parse(html: &str, mob_name: &str) -> Self {
        let document = Html::parse_document(html);

        Self {
            stats: StatParser::parse(&document),
            drops: LootParser::parse(&document, LootSection::Drop),
            spoils: LootParser::parse(&document, LootSection::Spoil),
            attributes: MarkerParser::parse(&document, mob_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Физ.\n\tАтк.  "), "Физ. Атк.");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_parse_full_page() {
        let html = fixtures::mob_page(90, 28, false);
        let page = MobPage::parse(&html, "Elder Red Keltir");

        assert!(page.stats.is_some());
        assert_eq!(page.drops.len(), 2);
        assert_eq!(page.spoils.len(), 2);
        assert_eq!(page.attributes.hp_multiplier, 3);
        assert!(!page.attributes.is_harbinger);
    }
}
