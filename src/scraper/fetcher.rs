//! Detail page retrieval.
//!
//! [`HttpFetcher`] talks to the wiki with a per-request timeout and retries
//! transient failures with linear backoff. [`CachedFetcher`] puts the TTL page
//! cache in front of any other fetcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::cache::PageCache;
use super::detail_url;
use crate::clock::Clock;
use crate::error::FetchError;
use crate::retry::{RetryConfig, retry};

/// Source of raw detail pages, addressed by detail path.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, detail_path: &str) -> Result<String, FetchError>;
}

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: super::BASE_URL.to_string(),
            user_agent: super::USER_AGENT.to_string(),
            timeout: Duration::from_secs(15),
            retry: RetryConfig::default(),
        }
    }
}

/// Fetches pages from the wiki over HTTP
pub struct HttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
    clock: Arc<dyn Clock>,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig, clock: Arc<dyn Clock>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            config,
            clock,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, detail_path: &str) -> Result<String, FetchError> {
        let url = detail_url(&self.config.base_url, detail_path);
        debug!("GET {}", url);

        retry(
            &self.config.retry,
            self.clock.as_ref(),
            &format!("fetch {}", detail_path),
            FetchError::is_transient,
            || self.fetch_once(&url),
        )
        .await
    }
}

/// Serves pages from the on-disk cache, falling back to the inner fetcher.
pub struct CachedFetcher<F> {
    inner: F,
    cache: PageCache,
    clock: Arc<dyn Clock>,
}

impl<F: PageFetcher> CachedFetcher<F> {
    pub fn new(inner: F, cache: PageCache, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            cache,
            clock,
        }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for CachedFetcher<F> {
    async fn fetch(&self, detail_path: &str) -> Result<String, FetchError> {
        if let Some(html) = self.cache.get(detail_path, self.clock.now()) {
            debug!("Cache hit: {}", detail_path);
            return Ok(html);
        }

        let html = self.inner.fetch(detail_path).await?;
        if let Err(e) = self.cache.set(detail_path, &html, self.clock.now()) {
            warn!("Could not cache {}: {}", detail_path, e);
        }
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for CountingFetcher {
        async fn fetch(&self, detail_path: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("<html>{}</html>", detail_path))
        }
    }

    #[tokio::test]
    async fn test_cached_fetcher_hits_network_once() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = PageCache::new(dir.path().to_path_buf(), chrono::Duration::hours(1));
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
            },
            cache,
            clock,
        );

        let first = fetcher.fetch("20537-elder-red-keltir").await.unwrap();
        let second = fetcher.fetch("20537-elder-red-keltir").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_fetcher_refetches_after_ttl() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = PageCache::new(dir.path().to_path_buf(), chrono::Duration::seconds(1));
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
            },
            cache,
            clock.clone(),
        );

        fetcher.fetch("keltir").await.unwrap();
        clock.sleep(Duration::from_secs(5)).await;
        fetcher.fetch("keltir").await.unwrap();

        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unwritable_cache_still_returns_page() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("pages");
        std::fs::write(&blocker, "not a directory").unwrap();

        let clock = Arc::new(ManualClock::default());
        let cache = PageCache::new(blocker, chrono::Duration::hours(1));
        let fetcher = CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
            },
            cache,
            clock,
        );

        let first = fetcher.fetch("keltir").await.unwrap();
        let second = fetcher.fetch("keltir").await.unwrap();

        assert_eq!(first, "<html>keltir</html>");
        assert_eq!(second, first);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_host_is_not_retried() {
        let clock = Arc::new(ManualClock::default());
        let config = HttpFetcherConfig {
            base_url: "http://mobwiki-host.invalid".to_string(),
            timeout: Duration::from_secs(5),
            ..HttpFetcherConfig::default()
        };
        let fetcher = HttpFetcher::new(config, clock.clone()).unwrap();

        let err = fetcher.fetch("20537-elder-red-keltir").await.unwrap_err();

        assert!(matches!(err, FetchError::HostNotFound(_)), "got {:?}", err);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_http_fetcher_builds() {
        let fetcher = HttpFetcher::new(
            HttpFetcherConfig::default(),
            Arc::new(ManualClock::default()),
        );
        assert!(fetcher.is_ok());
    }
}
