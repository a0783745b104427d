//! Mob wiki collector
//!
//! CLI that scrapes monster stats and loot from the game wiki, merges them
//! with the currency listing and ranks mobs by farming efficiency.

mod cli;
mod clock;
mod collect;
mod config;
mod efficiency;
mod error;
mod labels;
mod merge;
mod normalize;
mod retry;
mod scraper;
mod storage;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mobwiki=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            data_dir,
            delay_ms,
            batch_size,
            retry_failed,
            cache,
        } => cli::run_collect(data_dir, delay_ms, batch_size, retry_failed, cache).await,
        Commands::Merge { data_dir } => cli::run_merge(data_dir).await,
        Commands::Analyze { data_dir, top } => cli::run_analyze(data_dir, top).await,
    }
}
