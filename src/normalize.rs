//! Label and value normalization.
//!
//! Pure functions: translate wiki labels into canonical keys and coerce
//! numeric-shaped strings ("1 400", "9s.") into integers. Applying
//! [`normalize`] to its own output changes nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{NormalizedStats, RawStatMap, StatKey, StatValue};

static LEADING_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)").expect("valid digit regex"));

/// Leading digit run of `text` after dropping all whitespace, if any.
pub fn leading_number(text: &str) -> Option<i64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    LEADING_DIGITS_RE
        .captures(&compact)
        .and_then(|caps| caps[1].parse().ok())
}

/// Integer for numeric-shaped text, the text unchanged otherwise.
pub fn coerce_numeric(text: &str) -> StatValue {
    match leading_number(text) {
        Some(n) => StatValue::Number(n),
        None => StatValue::Text(text.to_string()),
    }
}

fn coerce_value(value: &StatValue) -> StatValue {
    match value {
        StatValue::Text(text) => coerce_numeric(text),
        other => other.clone(),
    }
}

/// Translate labels to canonical keys; unmapped labels are kept verbatim.
///
/// When several labels resolve to one field, the first label in map order wins.
pub fn normalize(raw: &RawStatMap) -> NormalizedStats {
    let mut normalized = NormalizedStats::default();
    for (label, value) in raw {
        normalized
            .0
            .entry(StatKey::from_label(label))
            .or_insert_with(|| coerce_value(value));
    }
    normalized
}

/// Re-run coercion over already-normalized stats.
pub fn renormalize(stats: &NormalizedStats) -> NormalizedStats {
    let raw: RawStatMap = stats
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), value.clone()))
        .collect();
    normalize(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::StatField;
    use std::collections::BTreeMap;

    fn sample_raw() -> RawStatMap {
        let mut raw = RawStatMap::new();
        raw.insert("Уровень".into(), StatValue::Text("3".into()));
        raw.insert("HP".into(), StatValue::Text("1 400".into()));
        raw.insert("Время возрождения".into(), StatValue::Text("9s.".into()));
        raw.insert("Атрибут атаки".into(), StatValue::Text("Огонь".into()));
        raw.insert("Скорость бега".into(), StatValue::Text("140 ед.".into()));
        raw.insert(
            "Атрибуты защиты".into(),
            StatValue::Attributes(BTreeMap::from([("Огонь".to_string(), 20)])),
        );
        raw
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("9s."), StatValue::Number(9));
        assert_eq!(coerce_numeric("1 400"), StatValue::Number(1400));
        assert_eq!(coerce_numeric(" 67 "), StatValue::Number(67));
        assert_eq!(coerce_numeric("Огонь"), StatValue::Text("Огонь".into()));
        assert_eq!(coerce_numeric("x12"), StatValue::Text("x12".into()));
    }

    #[test]
    fn test_respawn_time_label_and_suffix() {
        let normalized = normalize(&sample_raw());
        assert_eq!(normalized.number(StatField::RespawnTime), Some(9));
        assert_eq!(normalized.number(StatField::Hp), Some(1400));
        assert_eq!(normalized.number(StatField::Level), Some(3));
    }

    #[test]
    fn test_unmapped_labels_are_preserved() {
        let normalized = normalize(&sample_raw());
        assert_eq!(
            normalized.0.get(&StatKey::Other("Скорость бега".into())),
            Some(&StatValue::Number(140))
        );
        assert_eq!(
            normalized.get(StatField::AttackAttribute),
            Some(&StatValue::Text("Огонь".into()))
        );
    }

    #[test]
    fn test_nested_attributes_pass_through() {
        let normalized = normalize(&sample_raw());
        match normalized.get(StatField::DefenceAttributes) {
            Some(StatValue::Attributes(attrs)) => assert_eq!(attrs["Огонь"], 20),
            other => panic!("unexpected defence attributes: {:?}", other),
        }
    }

    #[test]
    fn test_first_label_wins_for_shared_field() {
        let mut raw = RawStatMap::new();
        raw.insert("HP".into(), StatValue::Text("90".into()));
        raw.insert("hp".into(), StatValue::Text("120".into()));

        let normalized = normalize(&raw);
        assert_eq!(normalized.number(StatField::Hp), Some(90));
        assert_eq!(normalized.iter().count(), 1);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize(&sample_raw());
        let twice = renormalize(&once);
        assert_eq!(once, twice);
    }
}
