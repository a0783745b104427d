//! Collection orchestrator.
//!
//! Walks the listing in order, fetching, parsing and normalizing each detail
//! page, and records every outcome in a [`ResumableJob`]. One fetch is in
//! flight at a time; the rate limiter spaces successive fetches.

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use super::job::{FailedEntry, JobOptions, JobPaths, JobRecord, ResumableJob};
use crate::clock::Clock;
use crate::error::{CollectError, FetchError};
use crate::labels::StatField;
use crate::normalize::normalize;
use crate::scraper::{MobPage, PageFetcher, RateLimiter};
use crate::storage::read_json;
use crate::types::{CollectedMob, CurrencyDrop, MobListing};

/// Failure reason stored in the checkpoint for one record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no_path")]
    NoPath,
    #[error("no_stats")]
    NoStats,
    #[error("{0}")]
    Fetch(#[from] FetchError),
}

impl JobRecord for CollectedMob {
    fn index(&self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub listing: PathBuf,
    pub paths: JobPaths,
    pub batch_size: usize,
    pub request_delay: Duration,
    pub retry_failed: bool,
}

pub struct Collector<F> {
    fetcher: F,
    clock: Arc<dyn Clock>,
    limiter: RateLimiter,
    settings: CollectorSettings,
}

impl<F: PageFetcher> Collector<F> {
    pub fn new(fetcher: F, clock: Arc<dyn Clock>, settings: CollectorSettings) -> Self {
        let limiter = RateLimiter::new(clock.clone(), settings.request_delay);
        Self {
            fetcher,
            clock,
            limiter,
            settings,
        }
    }

    /// Load the listing and open (or resume) the job.
    ///
    /// A missing listing is fatal and nothing is written.
    pub fn start(&self) -> Result<CollectionRun<'_, F>, CollectError> {
        let listing: Vec<MobListing> = read_json(&self.settings.listing)?;
        info!("Loaded {} mobs from {}", listing.len(), self.settings.listing.display());

        let job = ResumableJob::open(
            self.settings.paths.clone(),
            JobOptions {
                total: listing.len(),
                batch_size: self.settings.batch_size,
                retry_failed: self.settings.retry_failed,
            },
            self.clock.now(),
        )?;

        let queue: VecDeque<usize> = (0..listing.len()).filter(|i| !job.is_done(*i)).collect();
        let skipped = listing.len() - queue.len();
        info!("To process: {} / {}", queue.len(), listing.len());
        if queue.is_empty() {
            info!("All mobs already processed");
        }

        Ok(CollectionRun {
            collector: self,
            listing,
            job,
            queue,
            skipped,
            session: SessionCounts::default(),
            session_start: self.clock.now(),
        })
    }

    /// Collect everything that is left and finalize.
    pub async fn run(&self) -> Result<CollectionSummary, CollectError> {
        let mut run = self.start()?;
        while run.step().await?.is_some() {}
        run.finish()
    }

    async fn collect_one(&self, index: usize, mob: &MobListing) -> Result<CollectedMob, RecordError> {
        let detail_path = mob.detail_path().ok_or(RecordError::NoPath)?;

        self.limiter.acquire().await;
        let html = self.fetcher.fetch(&detail_path).await?;

        let page = MobPage::parse(&html, &mob.name);
        let raw = page.stats.ok_or(RecordError::NoStats)?;

        let mut stats = normalize(&raw);
        let level = stats.remove(StatField::Level).and_then(|v| v.as_number());

        Ok(CollectedMob {
            index,
            id: mob.id,
            name: mob.name.clone(),
            href: mob.href.clone(),
            level,
            stats,
            drops: page.drops,
            spoils: page.spoils,
            adena: CurrencyDrop::from(mob),
            attributes: page.attributes,
            fetched_at: self.clock.now(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SessionCounts {
    collected: usize,
    failed: usize,
}

/// Outcome of one processed record.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Collected { index: usize },
    Failed { index: usize, error: String },
}

/// An in-progress collection. Dropping it without [`finish`](Self::finish)
/// leaves the checkpoint in place for the next run.
pub struct CollectionRun<'a, F> {
    collector: &'a Collector<F>,
    listing: Vec<MobListing>,
    job: ResumableJob<CollectedMob>,
    queue: VecDeque<usize>,
    skipped: usize,
    session: SessionCounts,
    session_start: DateTime<Utc>,
}

impl<F: PageFetcher> CollectionRun<'_, F> {
    /// Process the next pending record; `None` once the queue is empty.
    pub async fn step(&mut self) -> Result<Option<StepOutcome>, CollectError> {
        let Some(index) = self.queue.pop_front() else {
            return Ok(None);
        };
        let mob = &self.listing[index];
        let position = format!("[{}/{}]", index + 1, self.listing.len());

        match self.collector.collect_one(index, mob).await {
            Ok(record) => {
                info!(
                    "{} {} (Lv.{}, HP:{}, EXP:{})",
                    position,
                    record.name,
                    display_opt(record.level),
                    display_opt(record.stats.number(StatField::Hp)),
                    display_opt(record.stats.number(StatField::Exp)),
                );
                self.job.record_success(record)?;
                self.session.collected += 1;
                Ok(Some(StepOutcome::Collected { index }))
            }
            Err(e) => {
                match &e {
                    RecordError::NoPath => warn!("{} Skipping {}: no detail path", position, mob.name),
                    RecordError::NoStats => warn!("{} No stats: {}", position, mob.name),
                    RecordError::Fetch(err) => warn!("{} Failed {}: {}", position, mob.name, err),
                }
                let error = e.to_string();
                self.job.record_failure(FailedEntry {
                    index,
                    name: mob.name.clone(),
                    error: error.clone(),
                })?;
                self.session.failed += 1;
                Ok(Some(StepOutcome::Failed { index, error }))
            }
        }
    }

    /// Finalize the job and summarize the whole collection.
    pub fn finish(self) -> Result<CollectionSummary, CollectError> {
        let finished_at = self.collector.clock.now();
        let output = self.collector.settings.paths.output.clone();
        let outcome = self.job.finalize()?;

        let no_data = outcome
            .failed
            .iter()
            .filter(|f| f.error == RecordError::NoStats.to_string())
            .count();

        let summary = CollectionSummary {
            total: self.listing.len(),
            collected: outcome.results.len(),
            failed: outcome.failed.len() - no_data,
            no_data,
            processed_this_run: self.session.collected + self.session.failed,
            skipped_on_resume: self.skipped,
            resumed: outcome.resumed,
            elapsed: finished_at - self.session_start,
            output,
            highlights: Highlights::from_results(&outcome.results),
        };
        info!(
            "Collection finished: {} ok, {} failed, {} without data",
            summary.collected, summary.failed, summary.no_data
        );
        Ok(summary)
    }
}

fn display_opt(value: Option<i64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

/// Dataset statistics shown after a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlights {
    pub level_range: Option<(i64, i64)>,
    pub average_exp: Option<f64>,
    pub with_drops: usize,
    pub with_spoils: usize,
    pub harbingers: usize,
    pub treasure_chests: usize,
    pub hp_multiplied: usize,
    pub max_hp_multiplier: u32,
}

impl Highlights {
    fn from_results(results: &[CollectedMob]) -> Self {
        let levels: Vec<i64> = results.iter().filter_map(|r| r.level).collect();
        let exps: Vec<i64> = results
            .iter()
            .filter_map(|r| r.stats.number(StatField::Exp))
            .collect();

        Self {
            level_range: levels
                .iter()
                .min()
                .zip(levels.iter().max())
                .map(|(lo, hi)| (*lo, *hi)),
            average_exp: if exps.is_empty() {
                None
            } else {
                Some(exps.iter().sum::<i64>() as f64 / exps.len() as f64)
            },
            with_drops: results.iter().filter(|r| !r.drops.is_empty()).count(),
            with_spoils: results.iter().filter(|r| !r.spoils.is_empty()).count(),
            harbingers: results.iter().filter(|r| r.attributes.is_harbinger).count(),
            treasure_chests: results
                .iter()
                .filter(|r| r.attributes.is_treasure_chest)
                .count(),
            hp_multiplied: results
                .iter()
                .filter(|r| r.attributes.hp_multiplier > 1)
                .count(),
            max_hp_multiplier: results
                .iter()
                .map(|r| r.attributes.hp_multiplier)
                .max()
                .unwrap_or(1),
        }
    }
}

/// Final report of a collection run.
#[derive(Debug, Clone)]
pub struct CollectionSummary {
    pub total: usize,
    pub collected: usize,
    pub failed: usize,
    pub no_data: usize,
    pub processed_this_run: usize,
    pub skipped_on_resume: usize,
    pub resumed: bool,
    pub elapsed: chrono::Duration,
    pub output: PathBuf,
    pub highlights: Highlights,
}

impl fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Collection finished ===")?;
        if self.resumed {
            writeln!(
                f,
                "Resumed: {} already done, {} processed this run",
                self.skipped_on_resume, self.processed_this_run
            )?;
        }
        writeln!(f, "Success:  {}/{}", self.collected, self.total)?;
        writeln!(f, "Failed:   {}", self.failed)?;
        writeln!(f, "No data:  {}", self.no_data)?;
        writeln!(f, "Time:     {}s", self.elapsed.num_seconds())?;
        writeln!(f, "Output:   {}", self.output.display())?;

        let h = &self.highlights;
        if let Some((lo, hi)) = h.level_range {
            writeln!(f, "Levels:   {} - {}", lo, hi)?;
        }
        if let Some(avg) = h.average_exp {
            writeln!(f, "Avg EXP:  {:.0}", avg)?;
        }
        writeln!(f, "With drops:  {}/{}", h.with_drops, self.collected)?;
        writeln!(f, "With spoils: {}/{}", h.with_spoils, self.collected)?;
        writeln!(f, "Harbinger of Ankou: {}", h.harbingers)?;
        writeln!(f, "Treasure chests:    {}", h.treasure_chests)?;
        write!(
            f,
            "HP multiplier:      {} (max {}x)",
            h.hp_multiplied, h.max_hp_multiplier
        )
    }
}
