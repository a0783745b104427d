//! Configuration for the mob collector.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collect::{CollectorSettings, JobPaths};
use crate::retry::RetryConfig;
use crate::scraper::{BASE_URL, HttpFetcherConfig, USER_AGENT};

/// Wiki connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Collection loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_batch_save_size")]
    pub batch_save_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_request_delay_ms() -> u64 {
    300
}

fn default_batch_save_size() -> usize {
    50
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    300
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
            batch_save_size: default_batch_save_size(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

/// File locations. Names are relative to `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub listing: String,
    pub output: String,
    pub temp_output: String,
    pub checkpoint: String,
    pub journal: String,
    pub database: String,
    pub database_with_data: String,
    pub efficiency: String,
    pub analysis: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            listing: "mobs_adena.json".to_string(),
            output: "mobs_full_stats.json".to_string(),
            temp_output: ".mobs_full_stats_temp.json".to_string(),
            checkpoint: ".collection_progress.json".to_string(),
            journal: ".collection_journal.jsonl".to_string(),
            database: "mobs_full_database.json".to_string(),
            database_with_data: "mobs_with_data.json".to_string(),
            efficiency: "mobs_with_efficiency.json".to_string(),
            analysis: "efficiency_analysis.json".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn job_paths(&self) -> JobPaths {
        JobPaths {
            output: self.resolve(&self.output),
            temp_output: self.resolve(&self.temp_output),
            checkpoint: self.resolve(&self.checkpoint),
            journal: self.resolve(&self.journal),
        }
    }
}

/// Page cache configuration. A relative `dir` is resolved under `paths.data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache/pages")
}

fn default_ttl_hours() -> i64 {
    168
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_cache_dir(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub wiki: WikiConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (MOBWIKI_COLLECTOR__BATCH_SAVE_SIZE, etc.)
            .add_source(
                config::Environment::with_prefix("MOBWIKI")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn fetcher_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig {
            base_url: self.wiki.base_url.clone(),
            user_agent: self.wiki.user_agent.clone(),
            timeout: Duration::from_secs(self.wiki.timeout_secs),
            retry: RetryConfig {
                max_retries: self.collector.max_retries,
                base_delay: Duration::from_millis(self.collector.retry_base_delay_ms),
            },
        }
    }

    /// Page cache directory, following `--data-dir` unless configured absolute.
    pub fn cache_dir(&self) -> PathBuf {
        self.paths.data_dir.join(&self.cache.dir)
    }

    pub fn collector_settings(&self, retry_failed: bool) -> CollectorSettings {
        CollectorSettings {
            listing: self.paths.resolve(&self.paths.listing),
            paths: self.paths.job_paths(),
            batch_size: self.collector.batch_save_size,
            request_delay: Duration::from_millis(self.collector.request_delay_ms),
            retry_failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.collector.batch_save_size, 50);
        assert_eq!(config.collector.request_delay_ms, 300);
        assert_eq!(config.wiki.timeout_secs, 15);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn test_paths_resolve_under_data_dir() {
        let mut config = AppConfig::default();
        config.paths.data_dir = PathBuf::from("/tmp/mobs");

        let settings = config.collector_settings(false);
        assert_eq!(settings.listing, PathBuf::from("/tmp/mobs/mobs_adena.json"));
        assert_eq!(
            settings.paths.checkpoint,
            PathBuf::from("/tmp/mobs/.collection_progress.json")
        );
        assert_eq!(settings.request_delay, Duration::from_millis(300));
    }

    #[test]
    fn test_cache_dir_follows_data_dir() {
        let mut config = AppConfig::default();
        assert_eq!(config.cache_dir(), PathBuf::from("data/cache/pages"));

        config.paths.data_dir = PathBuf::from("/tmp/mobs");
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/mobs/cache/pages"));

        config.cache.dir = PathBuf::from("/var/cache/mobwiki");
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/mobwiki"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .add_source(config::File::from_str(
                "[collector]\nbatch_save_size = 10\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.collector.batch_save_size, 10);
        assert_eq!(config.collector.max_retries, 3);
        assert_eq!(config.paths.output, "mobs_full_stats.json");
    }
}
