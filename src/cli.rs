//! CLI commands for mobwiki.
//!
//! `collect` scrapes detail pages for the listing, `merge` joins them into the
//! mob database, and `analyze` ranks the database by farming efficiency.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::clock::{Clock, TokioClock};
use crate::collect::{CollectionSummary, Collector, CollectorSettings};
use crate::config::AppConfig;
use crate::efficiency::{analyze, enrich, sort_by_efficiency};
use crate::merge::merge;
use crate::scraper::{CachedFetcher, HttpFetcher, PageCache, PageFetcher};
use crate::storage::{read_json, write_json_atomic};
use crate::types::{CollectedMob, EnrichedMob, MobListing};

#[derive(Parser)]
#[command(name = "mobwiki")]
#[command(version, about = "Mob stats collector and farming efficiency analyzer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect stats, drops and spoils for every mob in the listing
    Collect {
        /// Data directory override
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Delay between requests in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Records between checkpoint saves
        #[arg(long)]
        batch_size: Option<usize>,

        /// Attempt previously failed records again
        #[arg(long)]
        retry_failed: bool,

        /// Serve pages from the on-disk cache when fresh
        #[arg(long)]
        cache: bool,
    },

    /// Merge collected stats into the listing
    Merge {
        /// Data directory override
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Compute efficiency metrics and rankings
    Analyze {
        /// Data directory override
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Entries kept per ranking
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
}

fn load_config(data_dir: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load().context("Failed to load configuration")?;
    if let Some(dir) = data_dir {
        config.paths.data_dir = dir;
    }
    Ok(config)
}

/// Run the collection and print its summary.
pub async fn run_collect(
    data_dir: Option<PathBuf>,
    delay_ms: Option<u64>,
    batch_size: Option<usize>,
    retry_failed: bool,
    cache: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(data_dir)?;
    if let Some(ms) = delay_ms {
        config.collector.request_delay_ms = ms;
    }
    if let Some(size) = batch_size {
        config.collector.batch_save_size = size;
    }
    if cache {
        config.cache.enabled = true;
    }

    info!("Collecting from {}", config.wiki.base_url);
    info!(
        "Delay {}ms, batch {}, retries {}",
        config.collector.request_delay_ms,
        config.collector.batch_save_size,
        config.collector.max_retries
    );

    let clock: Arc<dyn Clock> = Arc::new(TokioClock);
    let settings = config.collector_settings(retry_failed);
    let http = HttpFetcher::new(config.fetcher_config(), clock.clone())
        .context("Failed to build HTTP client")?;

    let summary = if config.cache.enabled {
        let cache_dir = config.cache_dir();
        info!("Page cache: {}", cache_dir.display());
        let cache = PageCache::new(
            cache_dir,
            chrono::Duration::hours(config.cache.ttl_hours),
        );
        collect_with(CachedFetcher::new(http, cache, clock.clone()), clock, settings).await?
    } else {
        collect_with(http, clock, settings).await?
    };

    println!("{}", summary);
    Ok(())
}

async fn collect_with<F: PageFetcher>(
    fetcher: F,
    clock: Arc<dyn Clock>,
    settings: CollectorSettings,
) -> anyhow::Result<CollectionSummary> {
    let listing = settings.listing.clone();
    let collector = Collector::new(fetcher, clock, settings);
    collector
        .run()
        .await
        .with_context(|| format!("Collection from {} failed", listing.display()))
}

/// Join collected stats onto the listing and write the database files.
pub async fn run_merge(data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(data_dir)?;
    let paths = &config.paths;

    let listing: Vec<MobListing> = read_json(&paths.resolve(&paths.listing))?;
    let collected: Vec<CollectedMob> = read_json(&paths.resolve(&paths.output))?;
    info!(
        "Merging {} collected records into {} listed mobs",
        collected.len(),
        listing.len()
    );

    let outcome = merge(&listing, &collected);
    for orphan in &outcome.report.orphans {
        warn!(
            "Unmatched collected record #{} {} (id {:?})",
            orphan.index, orphan.name, orphan.id
        );
    }
    for id in &outcome.report.duplicate_ids {
        warn!("Id {} appears on several collected records", id);
    }

    if outcome.report.has_warnings() {
        warn!(
            "Join mismatches: {} orphans, {} duplicate ids, {} listing rows without id",
            outcome.report.orphans.len(),
            outcome.report.duplicate_ids.len(),
            outcome.report.listing_without_id
        );
    }

    let database = paths.resolve(&paths.database);
    let with_data_path = paths.resolve(&paths.database_with_data);
    let with_data = outcome.with_data();
    write_json_atomic(&database, &outcome.mobs)?;
    write_json_atomic(&with_data_path, &with_data)?;

    println!("=== Merge finished ===");
    println!("{}", outcome.report);
    println!("Database:  {} ({} mobs)", database.display(), outcome.mobs.len());
    println!("With data: {} ({} mobs)", with_data_path.display(), with_data.len());
    Ok(())
}

/// Rank the merged database and write the efficiency files.
pub async fn run_analyze(data_dir: Option<PathBuf>, top: usize) -> anyhow::Result<()> {
    let config = load_config(data_dir)?;
    let paths = &config.paths;

    let database = paths.resolve(&paths.database);
    let mobs: Vec<EnrichedMob> = read_json(&database)
        .with_context(|| format!("Run `mobwiki merge` first to build {}", database.display()))?;
    info!("Loaded {} mobs", mobs.len());

    let records = sort_by_efficiency(&enrich(&mobs));
    let efficiency_path = paths.resolve(&paths.efficiency);
    write_json_atomic(&efficiency_path, &records)?;

    let analysis = analyze(&mobs, top, TokioClock.now());
    let analysis_path = paths.resolve(&paths.analysis);
    write_json_atomic(&analysis_path, &analysis)?;

    println!("{}", analysis);
    println!();
    println!("Efficiency: {}", efficiency_path.display());
    println!("Analysis:   {}", analysis_path.display());
    Ok(())
}
