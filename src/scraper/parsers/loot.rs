//! Drop and spoil table parser.
//!
//! Each lookup is scoped to its own section container (`#drop`, `#spoil`).
//! A row only counts when its nearest section ancestor is the requested one,
//! so nested or adjacent tables never leak items into the other list.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::element_text;
use crate::labels::is_monster_characteristic;
use crate::types::LootEntry;

static TD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));

/// Loot section of a detail page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LootSection {
    Drop,
    Spoil,
}

impl LootSection {
    /// Element id of the section container
    pub fn container_id(&self) -> &'static str {
        match self {
            LootSection::Drop => "drop",
            LootSection::Spoil => "spoil",
        }
    }

    fn from_container_id(id: &str) -> Option<Self> {
        match id {
            "drop" => Some(LootSection::Drop),
            "spoil" => Some(LootSection::Spoil),
            _ => None,
        }
    }

    fn row_selector(&self) -> Selector {
        let css = format!("#{} table tr", self.container_id());
        Selector::parse(&css).expect("valid loot row selector")
    }
}

/// Parser for drop/spoil tables
pub struct LootParser;

impl LootParser {
    pub fn parse_html(html: &str, section: LootSection) -> Vec<LootEntry> {
        Self::parse(&Html::parse_document(html), section)
    }

    /// Item rows of one section; empty when the section is absent.
    pub fn parse(document: &Html, section: LootSection) -> Vec<LootEntry> {
        let selector = section.row_selector();

        document
            .select(&selector)
            .filter(|row| Self::owning_section(row) == Some(section))
            .filter_map(|row| Self::parse_row(&row))
            .collect()
    }

    /// Section of the closest `#drop`/`#spoil` ancestor.
    fn owning_section(row: &ElementRef) -> Option<LootSection> {
        row.ancestors()
            .filter_map(ElementRef::wrap)
            .find_map(|el| el.value().id().and_then(LootSection::from_container_id))
    }

    fn parse_row(row: &ElementRef) -> Option<LootEntry> {
        let cells: Vec<ElementRef> = row.select(&TD_SELECTOR).collect();
        if cells.len() < 3 {
            return None;
        }

        // Group chance summary rows span the whole table
        if cells.iter().any(|c| c.value().attr("colspan").is_some()) {
            return None;
        }

        let name = element_text(&cells[0]);
        if name.is_empty() || name.contains("Шанс группы") || is_monster_characteristic(&name) {
            return None;
        }

        let amount = element_text(&cells[1]);
        let chance = element_text(&cells[2]);
        if amount.is_empty() || chance.is_empty() || Self::is_chance_header(&chance) {
            return None;
        }

        Some(LootEntry {
            name,
            amount,
            chance,
        })
    }

    fn is_chance_header(text: &str) -> bool {
        let lower = text.to_lowercase();
        lower.contains("шанс") || lower.contains("chance")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::parsers::fixtures;
    use std::collections::HashSet;

    #[test]
    fn test_parse_drops() {
        let drops = LootParser::parse_html(&fixtures::mob_page(90, 28, false), LootSection::Drop);

        assert_eq!(drops.len(), 2);
        assert_eq!(drops[0].name, "Кожа животного");
        assert_eq!(drops[0].amount, "1-2");
        assert_eq!(drops[0].chance, "45.5%");
        assert_eq!(drops[1].name, "Кость животного");
    }

    #[test]
    fn test_currency_rows_excluded() {
        let drops = LootParser::parse_html(&fixtures::mob_page(90, 28, false), LootSection::Drop);
        assert!(drops.iter().all(|d| d.name != "Сундук с сокровищами Адены"));
        assert!(drops.iter().all(|d| d.name != "Адена"));
        assert!(drops.iter().all(|d| d.name != "Уровень"));
    }

    #[test]
    fn test_parse_spoils_skips_header_and_empty_rows() {
        let spoils = LootParser::parse_html(&fixtures::mob_page(90, 28, false), LootSection::Spoil);

        let names: Vec<&str> = spoils.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Нить", "Клык"]);
    }

    #[test]
    fn test_drop_and_spoil_are_disjoint() {
        let html = fixtures::mob_page(90, 28, false);
        let drops: HashSet<String> = LootParser::parse_html(&html, LootSection::Drop)
            .into_iter()
            .map(|d| d.name)
            .collect();
        let spoils: HashSet<String> = LootParser::parse_html(&html, LootSection::Spoil)
            .into_iter()
            .map(|s| s.name)
            .collect();

        assert!(drops.is_disjoint(&spoils));
    }

    #[test]
    fn test_nested_spoil_section_not_counted_as_drop() {
        let html = r#"<div id="drop">
            <table><tr><td>Кожа</td><td>1</td><td>10%</td></tr></table>
            <div id="spoil">
              <table><tr><td>Нить</td><td>2</td><td>30%</td></tr></table>
            </div>
        </div>"#;

        let drops = LootParser::parse_html(html, LootSection::Drop);
        let spoils = LootParser::parse_html(html, LootSection::Spoil);

        assert_eq!(drops.len(), 1);
        assert_eq!(drops[0].name, "Кожа");
        assert_eq!(spoils.len(), 1);
        assert_eq!(spoils[0].name, "Нить");
    }

    #[test]
    fn test_missing_sections() {
        assert!(LootParser::parse_html("<html></html>", LootSection::Drop).is_empty());
        assert!(LootParser::parse_html("<html></html>", LootSection::Spoil).is_empty());
    }
}
