//! Records flowing through the collector: listing input, parsed stats,
//! collected pages, and the merged database.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::labels::StatField;

static DETAIL_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/npc/(.+?)/live$").expect("valid detail path regex"));

/// Rounded midpoint of a currency range, halves rounding up.
pub fn average_currency(min: u64, max: u64) -> u64 {
    (min + max).div_ceil(2)
}

/// One row of the upstream currency-drop listing.
///
/// `avg_currency` is always recomputed from the range when a row is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ListingRow")]
pub struct MobListing {
    pub id: Option<u32>,
    pub name: String,
    #[serde(rename = "level")]
    pub level_label: String,
    pub href: String,
    #[serde(rename = "minAdena")]
    pub min_currency: u64,
    #[serde(rename = "maxAdena")]
    pub max_currency: u64,
    #[serde(rename = "chance")]
    pub drop_chance_percent: f64,
    #[serde(rename = "avgAdena")]
    pub avg_currency: u64,
}

impl MobListing {
    pub fn new(
        id: Option<u32>,
        name: impl Into<String>,
        href: impl Into<String>,
        min_currency: u64,
        max_currency: u64,
        drop_chance_percent: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            level_label: String::new(),
            href: href.into(),
            min_currency,
            max_currency,
            drop_chance_percent,
            avg_currency: average_currency(min_currency, max_currency),
        }
    }

    /// Path fragment between `/npc/` and `/live` in the listing link.
    pub fn detail_path(&self) -> Option<String> {
        DETAIL_PATH_RE
            .captures(self.href.trim())
            .map(|caps| caps[1].to_string())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Listing row as written upstream. A single amount leaves `maxAdena` out and
/// unparsable numbers come through as `null`.
#[derive(Deserialize)]
struct ListingRow {
    #[serde(default)]
    id: Option<u32>,
    name: String,
    #[serde(rename = "level", alias = "levelLabel", default, deserialize_with = "null_as_default")]
    level_label: String,
    #[serde(rename = "href", alias = "detailPath", default, deserialize_with = "null_as_default")]
    href: String,
    #[serde(rename = "minAdena", alias = "minCurrency", default)]
    min_currency: Option<u64>,
    #[serde(rename = "maxAdena", alias = "maxCurrency", default)]
    max_currency: Option<u64>,
    #[serde(rename = "chance", alias = "dropChancePercent", default)]
    drop_chance_percent: Option<f64>,
}

impl From<ListingRow> for MobListing {
    fn from(row: ListingRow) -> Self {
        let min = row.min_currency.or(row.max_currency).unwrap_or(0);
        let max = row.max_currency.unwrap_or(min).max(min);
        let mut listing = MobListing::new(
            row.id,
            row.name,
            row.href,
            min,
            max,
            row.drop_chance_percent.unwrap_or(0.0),
        );
        listing.level_label = row.level_label;
        listing
    }
}

/// Value of a single statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(i64),
    Text(String),
    /// Defence attributes: element name to resistance.
    Attributes(BTreeMap<String, i64>),
}

impl StatValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            StatValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Statistics as labelled on the page. First occurrence of a label wins.
pub type RawStatMap = BTreeMap<String, StatValue>;

/// Key of a normalized statistic: a known field, or an unmapped label kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatKey {
    Field(StatField),
    Other(String),
}

impl StatKey {
    pub fn from_label(label: &str) -> Self {
        match StatField::from_label(label) {
            Some(field) => StatKey::Field(field),
            None => StatKey::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatKey::Field(field) => field.key(),
            StatKey::Other(label) => label,
        }
    }
}

impl Serialize for StatKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(StatKey::from_label(&label))
    }
}

/// Statistics keyed by canonical field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedStats(pub BTreeMap<StatKey, StatValue>);

impl NormalizedStats {
    pub fn get(&self, field: StatField) -> Option<&StatValue> {
        self.0.get(&StatKey::Field(field))
    }

    pub fn number(&self, field: StatField) -> Option<i64> {
        self.get(field).and_then(StatValue::as_number)
    }

    pub fn insert(&mut self, key: StatKey, value: StatValue) {
        self.0.insert(key, value);
    }

    pub fn remove(&mut self, field: StatField) -> Option<StatValue> {
        self.0.remove(&StatKey::Field(field))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StatKey, &StatValue)> {
        self.0.iter()
    }
}

/// Item row of the drop or spoil table. `amount` may be a range such as "1-3".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub name: String,
    pub amount: String,
    pub chance: String,
}

pub type DropEntry = LootEntry;
pub type SpoilEntry = LootEntry;

/// Page markers that do not belong to the stats table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MobAttributes {
    pub is_harbinger: bool,
    pub is_treasure_chest: bool,
    pub hp_multiplier: u32,
}

impl Default for MobAttributes {
    fn default() -> Self {
        Self {
            is_harbinger: false,
            is_treasure_chest: false,
            hp_multiplier: 1,
        }
    }
}

/// Currency economics copied from the listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDrop {
    pub min: u64,
    pub max: u64,
    pub avg: u64,
    pub chance: f64,
}

impl From<&MobListing> for CurrencyDrop {
    fn from(listing: &MobListing) -> Self {
        Self {
            min: listing.min_currency,
            max: listing.max_currency,
            avg: listing.avg_currency,
            chance: listing.drop_chance_percent,
        }
    }
}

/// One successfully collected detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedMob {
    /// Position of the source row in the listing file.
    pub index: usize,
    pub id: Option<u32>,
    pub name: String,
    pub href: String,
    pub level: Option<i64>,
    /// Normalized statistics without `level`, which is lifted to the top.
    pub stats: NormalizedStats,
    pub drops: Vec<DropEntry>,
    pub spoils: Vec<SpoilEntry>,
    pub adena: CurrencyDrop,
    #[serde(default)]
    pub attributes: MobAttributes,
    pub fetched_at: DateTime<Utc>,
}

/// Listing row joined with whatever was collected for it.
///
/// Serialized flat: listing columns, then every statistic as a top-level key.
/// The listing's level text moves to `levelLabel` so `level` holds the number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DatabaseRow", into = "DatabaseRow")]
pub struct EnrichedMob {
    pub listing: MobListing,
    pub stats: NormalizedStats,
    pub drops: Vec<DropEntry>,
    pub spoils: Vec<SpoilEntry>,
    pub attributes: Option<MobAttributes>,
    pub has_data: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseRow {
    id: Option<u32>,
    name: String,
    #[serde(default)]
    level_label: String,
    #[serde(default)]
    href: String,
    #[serde(rename = "minAdena")]
    min_currency: u64,
    #[serde(rename = "maxAdena")]
    max_currency: u64,
    #[serde(rename = "chance", default)]
    drop_chance_percent: f64,
    #[serde(rename = "avgAdena")]
    avg_currency: u64,
    #[serde(flatten)]
    stats: NormalizedStats,
    #[serde(default)]
    drops: Vec<DropEntry>,
    #[serde(default)]
    spoils: Vec<SpoilEntry>,
    #[serde(default)]
    attributes: Option<MobAttributes>,
    #[serde(default)]
    has_data: bool,
    #[serde(default)]
    fetched_at: Option<DateTime<Utc>>,
}

impl From<EnrichedMob> for DatabaseRow {
    fn from(mob: EnrichedMob) -> Self {
        let listing = mob.listing;
        Self {
            id: listing.id,
            name: listing.name,
            level_label: listing.level_label,
            href: listing.href,
            min_currency: listing.min_currency,
            max_currency: listing.max_currency,
            drop_chance_percent: listing.drop_chance_percent,
            avg_currency: listing.avg_currency,
            stats: mob.stats,
            drops: mob.drops,
            spoils: mob.spoils,
            attributes: mob.attributes,
            has_data: mob.has_data,
            fetched_at: mob.fetched_at,
        }
    }
}

impl From<DatabaseRow> for EnrichedMob {
    fn from(row: DatabaseRow) -> Self {
        Self {
            listing: MobListing {
                id: row.id,
                name: row.name,
                level_label: row.level_label,
                href: row.href,
                min_currency: row.min_currency,
                max_currency: row.max_currency,
                drop_chance_percent: row.drop_chance_percent,
                avg_currency: row.avg_currency,
            },
            stats: row.stats,
            drops: row.drops,
            spoils: row.spoils,
            attributes: row.attributes,
            has_data: row.has_data,
            fetched_at: row.fetched_at,
        }
    }
}

impl EnrichedMob {
    /// Unenriched record for a listing row.
    pub fn from_listing(listing: &MobListing) -> Self {
        Self {
            listing: listing.clone(),
            stats: NormalizedStats::default(),
            drops: Vec::new(),
            spoils: Vec::new(),
            attributes: None,
            has_data: false,
            fetched_at: None,
        }
    }

    pub fn hp(&self) -> Option<i64> {
        self.stats.number(StatField::Hp)
    }

    pub fn exp(&self) -> Option<i64> {
        self.stats.number(StatField::Exp)
    }

    pub fn sp(&self) -> Option<i64> {
        self.stats.number(StatField::Sp)
    }

    pub fn level(&self) -> Option<i64> {
        self.stats.number(StatField::Level)
    }

    pub fn respawn_seconds(&self) -> Option<i64> {
        self.stats.number(StatField::RespawnTime)
    }

    pub fn avg_currency(&self) -> u64 {
        self.listing.avg_currency
    }
}

/// Enriched record with its hp-per-currency ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRecord {
    #[serde(flatten)]
    pub mob: EnrichedMob,
    pub efficiency: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_currency_rounds_half_up() {
        assert_eq!(average_currency(22, 38), 30);
        assert_eq!(average_currency(1, 2), 2);
        assert_eq!(average_currency(0, 0), 0);
    }

    #[test]
    fn test_listing_reads_upstream_field_names() {
        let json = r#"{
            "id": 20537,
            "name": "Elder Red Keltir",
            "level": "Ур. 3",
            "href": "/npc/20537-elder-red-keltir/live",
            "minAdena": 22,
            "maxAdena": 38,
            "chance": 70,
            "avgAdena": 999
        }"#;

        let listing: MobListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.id, Some(20537));
        assert_eq!(listing.level_label, "Ур. 3");
        assert_eq!(listing.avg_currency, 30);
        assert_eq!(
            listing.detail_path().as_deref(),
            Some("20537-elder-red-keltir")
        );
    }

    #[test]
    fn test_listing_accepts_null_id_and_missing_path() {
        let json = r#"{"id": null, "name": "Ghost", "minAdena": 1, "maxAdena": 3}"#;
        let listing: MobListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.id, None);
        assert_eq!(listing.detail_path(), None);
    }

    #[test]
    fn test_listing_tolerates_single_amount_and_nulls() {
        let json = r#"[
            {"id": 1, "name": "Fixed", "level": "Ур. 5", "href": "/npc/1-fixed/live",
             "minAdena": 40, "chance": 100, "avgAdena": null},
            {"id": 2, "name": "Broken", "level": "Ур. 6", "href": "/npc/2-broken/live",
             "minAdena": null, "maxAdena": null, "chance": null, "avgAdena": null}
        ]"#;

        let rows: Vec<MobListing> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].min_currency, 40);
        assert_eq!(rows[0].max_currency, 40);
        assert_eq!(rows[0].avg_currency, 40);
        assert_eq!(rows[1].min_currency, 0);
        assert_eq!(rows[1].avg_currency, 0);
        assert_eq!(rows[1].drop_chance_percent, 0.0);
        assert_eq!(rows[1].level_label, "Ур. 6");
    }

    #[test]
    fn test_normalized_stats_serialize_with_canonical_keys() {
        let mut stats = NormalizedStats::default();
        stats.insert(StatKey::Field(StatField::PAtk), StatValue::Number(12));
        stats.insert(StatKey::Other("Скорость".into()), StatValue::Text("быстро".into()));

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["pAtk"], 12);
        assert_eq!(json["Скорость"], "быстро");

        let back: NormalizedStats = serde_json::from_value(json).unwrap();
        assert_eq!(back.number(StatField::PAtk), Some(12));
    }

    #[test]
    fn test_enriched_mob_flattens_listing() {
        let listing = MobListing::new(Some(1), "Keltir", "/npc/1-keltir/live", 10, 20, 50.0);
        let mob = EnrichedMob::from_listing(&listing);
        let json = serde_json::to_value(&mob).unwrap();

        assert_eq!(json["avgAdena"], 15);
        assert_eq!(json["hasData"], false);
        let back: EnrichedMob = serde_json::from_value(json).unwrap();
        assert_eq!(back, mob);
    }

    #[test]
    fn test_enriched_mob_writes_stats_at_top_level() {
        let mut listing = MobListing::new(Some(1), "Keltir", "/npc/1-keltir/live", 22, 38, 70.0);
        listing.level_label = "Ур. 3".into();
        let mut mob = EnrichedMob::from_listing(&listing);
        mob.stats.insert(StatKey::Field(StatField::Hp), StatValue::Number(90));
        mob.stats.insert(StatKey::Field(StatField::Level), StatValue::Number(3));
        mob.stats.insert(StatKey::Field(StatField::RespawnTime), StatValue::Number(9));
        mob.has_data = true;

        let json = serde_json::to_value(&mob).unwrap();
        assert_eq!(json["hp"], 90);
        assert_eq!(json["level"], 3);
        assert_eq!(json["levelLabel"], "Ур. 3");
        assert_eq!(json["respawnTime"], 9);
        assert!(json.get("stats").is_none());

        let text = serde_json::to_string(&mob).unwrap();
        assert_eq!(text.matches("\"level\"").count(), 1);

        let back: EnrichedMob = serde_json::from_str(&text).unwrap();
        assert_eq!(back.hp(), Some(90));
        assert_eq!(back.level(), Some(3));
        assert_eq!(back, mob);
    }
}
