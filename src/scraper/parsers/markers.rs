//! Page markers outside the stats table: the Harbinger of Ankou tag, the HP
//! multiplier skill and treasure chests.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::element_text;
use crate::types::MobAttributes;

static ADDITIONAL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#result-title .item-name__additional").expect("valid selector")
});
static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static TR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static MULTIPLIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)x\)").expect("valid multiplier regex"));

pub struct MarkerParser;

impl MarkerParser {
    pub fn parse(document: &Html, mob_name: &str) -> MobAttributes {
        MobAttributes {
            is_harbinger: Self::is_harbinger(document),
            is_treasure_chest: Self::is_treasure_chest(mob_name),
            hp_multiplier: Self::hp_multiplier(document),
        }
    }

    fn is_harbinger(document: &Html) -> bool {
        document
            .select(&ADDITIONAL_SELECTOR)
            .any(|el| element_text(&el).to_lowercase().contains("harbinger of ankou"))
    }

    pub fn is_treasure_chest(mob_name: &str) -> bool {
        let lower = mob_name.to_lowercase();
        lower.contains("treasure chest") || lower.contains("сундук с сокровищами")
    }

    /// Multiplier from an "HP Increase (Nx)" skill row; 1 when absent.
    fn hp_multiplier(document: &Html) -> u32 {
        for table in document.select(&TABLE_SELECTOR) {
            let rows: Vec<ElementRef> = table.select(&TR_SELECTOR).collect();
            let Some(header) = rows.first() else {
                continue;
            };

            let header_text = element_text(header).to_lowercase();
            if !header_text.contains("skill") && !header_text.contains("умени") {
                continue;
            }

            for row in &rows {
                let text = element_text(row).to_lowercase();
                if !text.contains("hp") {
                    continue;
                }
                let multiplier = MULTIPLIER_RE
                    .captures(&text)
                    .and_then(|caps| caps[1].parse::<u32>().ok());
                if let Some(m) = multiplier.filter(|m| *m > 1) {
                    return m;
                }
            }
        }
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::parsers::fixtures;

    #[test]
    fn test_markers_from_page() {
        let document = Html::parse_document(&fixtures::mob_page(90, 28, true));
        let attrs = MarkerParser::parse(&document, "Elder Red Keltir");

        assert!(attrs.is_harbinger);
        assert!(!attrs.is_treasure_chest);
        assert_eq!(attrs.hp_multiplier, 3);
    }

    #[test]
    fn test_defaults_without_markers() {
        let document = Html::parse_document("<html><body></body></html>");
        let attrs = MarkerParser::parse(&document, "Keltir");
        assert_eq!(attrs, MobAttributes::default());
    }

    #[test]
    fn test_treasure_chest_name() {
        assert!(MarkerParser::is_treasure_chest("Сундук с сокровищами"));
        assert!(MarkerParser::is_treasure_chest("Treasure Chest"));
        assert!(!MarkerParser::is_treasure_chest("Gremlin"));
    }
}
