//! Farming efficiency metrics and rankings.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{EfficiencyRecord, EnrichedMob};

/// Hit points per currency unit, when both are positive.
pub fn efficiency(mob: &EnrichedMob) -> Option<f64> {
    let hp = mob.hp().filter(|hp| *hp > 0)?;
    let avg = mob.avg_currency();
    if avg == 0 {
        return None;
    }
    Some(hp as f64 / avg as f64)
}

/// Attach the hp-per-currency ratio to every record.
pub fn enrich(mobs: &[EnrichedMob]) -> Vec<EfficiencyRecord> {
    mobs.iter()
        .map(|mob| EfficiencyRecord {
            mob: mob.clone(),
            efficiency: efficiency(mob),
        })
        .collect()
}

/// Ranking metrics. Each returns `None` when an input is missing or a
/// divisor is not positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Metric {
    HpPerCurrency,
    ExpPerHp,
    ExpPerCurrency,
    SpPerHp,
    CurrencyPerMinute,
    Composite,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::HpPerCurrency,
        Metric::ExpPerHp,
        Metric::ExpPerCurrency,
        Metric::SpPerHp,
        Metric::CurrencyPerMinute,
        Metric::Composite,
    ];

    /// Key used in the analysis file.
    pub fn key(self) -> &'static str {
        match self {
            Metric::HpPerCurrency => "hpPerAdena",
            Metric::ExpPerHp => "expPerHp",
            Metric::ExpPerCurrency => "expPerAdena",
            Metric::SpPerHp => "spPerHp",
            Metric::CurrencyPerMinute => "adenaPerMinute",
            Metric::Composite => "comboMetric",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::HpPerCurrency => "HP/Adena",
            Metric::ExpPerHp => "EXP/HP",
            Metric::ExpPerCurrency => "EXP/Adena",
            Metric::SpPerHp => "SP/HP",
            Metric::CurrencyPerMinute => "Adena/min",
            Metric::Composite => "(EXP*SP+Adena)/HP",
        }
    }

    pub fn compute(self, mob: &EnrichedMob) -> Option<f64> {
        let positive_hp = || mob.hp().filter(|hp| *hp > 0).map(|hp| hp as f64);
        let positive_avg = || Some(mob.avg_currency()).filter(|a| *a > 0).map(|a| a as f64);

        match self {
            Metric::HpPerCurrency => efficiency(mob),
            Metric::ExpPerHp => Some(mob.exp()? as f64 / positive_hp()?),
            Metric::ExpPerCurrency => Some(mob.exp()? as f64 / positive_avg()?),
            Metric::SpPerHp => Some(mob.sp()? as f64 / positive_hp()?),
            Metric::CurrencyPerMinute => {
                let respawn = mob.respawn_seconds().filter(|s| *s > 0)? as f64;
                Some(positive_avg()? / (respawn / 60.0))
            }
            Metric::Composite => {
                let exp = mob.exp()? as f64;
                let sp = mob.sp().unwrap_or(0).max(1) as f64;
                Some((exp * sp + mob.avg_currency() as f64) / positive_hp()?)
            }
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record paired with its metric value.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub value: f64,
    pub item: T,
}

/// Sorted copy of the records that have a value for `metric`.
///
/// The sort is stable, so ties keep their input order. Records without a
/// value are left out. Descending unless `ascending`.
pub fn rank<T, F>(records: &[T], metric: F, ascending: bool) -> Vec<Ranked<T>>
where
    T: Clone,
    F: Fn(&T) -> Option<f64>,
{
    let mut ranked: Vec<Ranked<T>> = records
        .iter()
        .filter_map(|r| {
            metric(r)
                .filter(|v| v.is_finite())
                .map(|value| Ranked {
                    value,
                    item: r.clone(),
                })
        })
        .collect();

    ranked.sort_by(|a, b| {
        let ord = a.value.total_cmp(&b.value);
        if ascending { ord } else { ord.reverse() }
    });
    ranked
}

/// Every record ordered by hp-per-currency descending; records without a
/// ratio follow in input order.
pub fn sort_by_efficiency(records: &[EfficiencyRecord]) -> Vec<EfficiencyRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| match (a.efficiency, b.efficiency) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted
}

/// Row of a metric ranking in the analysis file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    pub id: Option<u32>,
    pub name: String,
    pub level: Option<i64>,
    pub hp: Option<i64>,
    pub exp: Option<i64>,
    pub avg_adena: u64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub best_exp: Option<String>,
    pub best_adena: Option<String>,
    pub best_combo: Option<String>,
}

/// Contents of the efficiency analysis file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyAnalysis {
    pub timestamp: DateTime<Utc>,
    pub total_mobs: usize,
    pub with_efficiency: usize,
    pub metrics: BTreeMap<&'static str, Vec<RankedEntry>>,
    pub statistics: BTreeMap<&'static str, MetricStats>,
    pub recommendations: Recommendations,
}

/// Rank every metric and keep the top `top_n` of each.
pub fn analyze(mobs: &[EnrichedMob], top_n: usize, now: DateTime<Utc>) -> EfficiencyAnalysis {
    let mut metrics = BTreeMap::new();
    let mut statistics = BTreeMap::new();
    let mut best: BTreeMap<Metric, String> = BTreeMap::new();

    for metric in Metric::ALL {
        let ranked = rank(mobs, |m| metric.compute(m), false);
        if ranked.is_empty() {
            metrics.insert(metric.key(), Vec::new());
            continue;
        }

        if let Some(stats) = metric_stats(&ranked) {
            statistics.insert(metric.key(), stats);
        }
        best.insert(metric, ranked[0].item.listing.name.clone());

        let top = ranked
            .iter()
            .take(top_n)
            .enumerate()
            .map(|(i, r)| RankedEntry {
                rank: i + 1,
                id: r.item.listing.id,
                name: r.item.listing.name.clone(),
                level: r.item.level(),
                hp: r.item.hp(),
                exp: r.item.exp(),
                avg_adena: r.item.avg_currency(),
                value: r.value,
            })
            .collect();
        metrics.insert(metric.key(), top);
    }

    EfficiencyAnalysis {
        timestamp: now,
        total_mobs: mobs.len(),
        with_efficiency: mobs.iter().filter(|m| efficiency(m).is_some()).count(),
        metrics,
        statistics,
        recommendations: Recommendations {
            best_exp: best.remove(&Metric::ExpPerHp),
            best_adena: best.remove(&Metric::ExpPerCurrency),
            best_combo: best.remove(&Metric::Composite),
        },
    }
}

fn metric_stats<T>(ranked: &[Ranked<T>]) -> Option<MetricStats> {
    if ranked.is_empty() {
        return None;
    }
    let values = ranked.iter().map(|r| r.value);
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    let avg = values.sum::<f64>() / ranked.len() as f64;

    Some(MetricStats {
        count: ranked.len(),
        min,
        max,
        avg,
    })
}

impl fmt::Display for EfficiencyAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Efficiency analysis ===")?;
        writeln!(f, "Mobs: {} ({} with HP/Adena)", self.total_mobs, self.with_efficiency)?;

        for metric in Metric::ALL {
            let Some(entries) = self.metrics.get(metric.key()) else {
                continue;
            };
            if entries.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{}", metric)?;
            for e in entries {
                writeln!(
                    f,
                    "{:>3}. {:<35} Lv.{:>2} {:>10.3}",
                    e.rank,
                    e.name,
                    e.level.map_or_else(|| "?".to_string(), |l| l.to_string()),
                    e.value
                )?;
            }
            if let Some(stats) = self.statistics.get(metric.key()) {
                writeln!(
                    f,
                    "     min {:.3} / max {:.3} / avg {:.3}",
                    stats.min, stats.max, stats.avg
                )?;
            }
        }

        let r = &self.recommendations;
        writeln!(f)?;
        writeln!(f, "Best for EXP:   {}", r.best_exp.as_deref().unwrap_or("-"))?;
        writeln!(f, "Best for Adena: {}", r.best_adena.as_deref().unwrap_or("-"))?;
        write!(f, "Best overall:   {}", r.best_combo.as_deref().unwrap_or("-"))
    }
}
