//! Stats table parser (`#result-stats table`).
//!
//! Rows hold one or two label/value pairs: `Уровень | 3 | Время возрождения | 9s.`.
//! Only labels from the characteristic dictionary are kept. The defence
//! attributes row carries a nested `element: value` list and is parsed
//! separately.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{clean_text, element_text};
use crate::labels::{StatField, is_defence_attributes_label, is_drop_section_marker};
use crate::normalize::coerce_numeric;
use crate::types::{RawStatMap, StatValue};

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#result-stats table").expect("valid selector"));
static TR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static TD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static P_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("valid selector"));
static ATTRIBUTE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:]+?)\s*:\s*(-?\d+)$").expect("valid attribute regex")
});

/// Parser for the statistics table
pub struct StatParser;

impl StatParser {
    /// Parse the stats table from a raw HTML string.
    pub fn parse_html(html: &str) -> Option<RawStatMap> {
        Self::parse(&Html::parse_document(html))
    }

    /// Extract recognised statistics, or `None` if the table is missing or empty.
    pub fn parse(document: &Html) -> Option<RawStatMap> {
        let table = document.select(&TABLE_SELECTOR).next()?;
        let rows: Vec<ElementRef> = table.select(&TR_SELECTOR).collect();
        let mut stats = RawStatMap::new();

        // Row 0 is the title row
        for row in rows.iter().skip(1) {
            let cells: Vec<ElementRef> = row.select(&TD_SELECTOR).collect();
            let Some(first) = cells.first() else {
                continue;
            };

            let first_text = element_text(first);
            if is_drop_section_marker(&first_text) || is_defence_attributes_label(&first_text) {
                continue;
            }

            for pair in cells.chunks(2) {
                let label = element_text(&pair[0]);
                let value = pair.get(1).map(element_text).unwrap_or_default();
                Self::insert_pair(&mut stats, label, &value);
            }
        }

        if let Some((label, attributes)) = Self::parse_defence_attributes(&rows) {
            stats
                .entry(label)
                .or_insert(StatValue::Attributes(attributes));
        }

        if stats.is_empty() { None } else { Some(stats) }
    }

    fn insert_pair(stats: &mut RawStatMap, label: String, value: &str) {
        if value.is_empty() {
            return;
        }
        match StatField::from_label(&label) {
            None | Some(StatField::DefenceAttributes) => {}
            Some(_) => {
                stats.entry(label).or_insert_with(|| coerce_numeric(value));
            }
        }
    }

    /// Find the defence attributes row and read its `name: value` lines.
    fn parse_defence_attributes(rows: &[ElementRef]) -> Option<(String, BTreeMap<String, i64>)> {
        let (label, value_cell) = rows.iter().find_map(|row| {
            let cells: Vec<ElementRef> = row.select(&TD_SELECTOR).collect();
            let label = element_text(cells.first()?);
            if is_defence_attributes_label(&label) {
                Some((label, *cells.get(1)?))
            } else {
                None
            }
        })?;

        let mut lines: Vec<String> = value_cell.select(&P_SELECTOR).map(|p| element_text(&p)).collect();
        if lines.is_empty() {
            let text = value_cell.text().collect::<String>();
            lines = text.lines().map(clean_text).collect();
        }

        let mut attributes = BTreeMap::new();
        for line in lines {
            if line.is_empty() || line.contains('%') {
                continue;
            }
            if let Some(caps) = ATTRIBUTE_LINE_RE.captures(&line) {
                if let Ok(value) = caps[2].parse::<i64>() {
                    attributes.entry(caps[1].trim().to_string()).or_insert(value);
                }
            }
        }

        if attributes.is_empty() {
            None
        } else {
            Some((label, attributes))
        }
    }
}
