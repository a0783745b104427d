//! Join collected pages onto the listing.
//!
//! The numeric id is the only join key. Records that cannot be joined are
//! reported and kept in the outcome, never dropped.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::labels::StatField;
use crate::normalize::renormalize;
use crate::types::{CollectedMob, EnrichedMob, MobListing, StatKey, StatValue};

/// A collected record with no listing row to attach to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Orphan {
    pub index: usize,
    pub id: Option<u32>,
    pub name: String,
}

/// Join mismatches found while merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinReport {
    pub matched: usize,
    pub orphans: Vec<Orphan>,
    /// Ids carried by more than one collected record.
    pub duplicate_ids: Vec<u32>,
    pub listing_without_id: usize,
    pub listing_without_data: usize,
}

impl JoinReport {
    pub fn has_warnings(&self) -> bool {
        !self.orphans.is_empty() || !self.duplicate_ids.is_empty() || self.listing_without_id > 0
    }
}

impl fmt::Display for JoinReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matched:              {}", self.matched)?;
        writeln!(f, "Orphan records:       {}", self.orphans.len())?;
        writeln!(f, "Duplicate ids:        {}", self.duplicate_ids.len())?;
        writeln!(f, "Listing without id:   {}", self.listing_without_id)?;
        write!(f, "Listing without data: {}", self.listing_without_data)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// One record per listing row, in listing order.
    pub mobs: Vec<EnrichedMob>,
    /// Collected records that matched no listing row.
    pub orphans: Vec<CollectedMob>,
    pub report: JoinReport,
}

impl MergeOutcome {
    pub fn with_data(&self) -> Vec<EnrichedMob> {
        self.mobs.iter().filter(|m| m.has_data).cloned().collect()
    }
}

/// New record with the collected page applied on top of `base`.
pub fn apply_patch(base: &EnrichedMob, patch: &CollectedMob) -> EnrichedMob {
    let mut stats = renormalize(&patch.stats);
    if let Some(level) = patch.level {
        stats.insert(StatKey::Field(StatField::Level), StatValue::Number(level));
    }
    let has_data = stats.number(StatField::Hp).is_some();

    EnrichedMob {
        listing: base.listing.clone(),
        stats,
        drops: patch.drops.clone(),
        spoils: patch.spoils.clone(),
        attributes: Some(patch.attributes.clone()),
        has_data,
        fetched_at: Some(patch.fetched_at),
    }
}

/// Join `collected` onto `listing` by id.
///
/// When several collected records share an id, each listing row with that id
/// takes the one with the same name if there is one, otherwise the earliest
/// unused one.
pub fn merge(listing: &[MobListing], collected: &[CollectedMob]) -> MergeOutcome {
    let mut by_id: HashMap<u32, VecDeque<&CollectedMob>> = HashMap::new();
    let mut orphans: Vec<&CollectedMob> = Vec::new();
    let mut id_counts: BTreeMap<u32, usize> = BTreeMap::new();

    for record in collected {
        match record.id {
            Some(id) => {
                *id_counts.entry(id).or_default() += 1;
                by_id.entry(id).or_default().push_back(record);
            }
            None => orphans.push(record),
        }
    }

    let mut report = JoinReport {
        duplicate_ids: id_counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect(),
        ..JoinReport::default()
    };

    let mobs: Vec<EnrichedMob> = listing
        .iter()
        .map(|row| {
            let base = EnrichedMob::from_listing(row);
            let Some(id) = row.id else {
                report.listing_without_id += 1;
                return base;
            };

            let candidates = by_id.get_mut(&id);
            let matched = candidates.and_then(|queue| {
                let position = queue
                    .iter()
                    .position(|c| c.name == row.name)
                    .unwrap_or(0);
                queue.remove(position)
            });

            match matched {
                Some(record) => {
                    report.matched += 1;
                    apply_patch(&base, record)
                }
                None => base,
            }
        })
        .collect();

    orphans.extend(by_id.into_values().flatten());
    orphans.sort_by_key(|r| r.index);

    report.listing_without_data = mobs.iter().filter(|m| !m.has_data).count();
    report.orphans = orphans
        .iter()
        .map(|r| Orphan {
            index: r.index,
            id: r.id,
            name: r.name.clone(),
        })
        .collect();

    MergeOutcome {
        mobs,
        orphans: orphans.into_iter().cloned().collect(),
        report,
    }
}
