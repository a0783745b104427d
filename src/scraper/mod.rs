//! Web scraper module for the game wiki
//!
//! Provides page fetching, caching, request pacing and HTML parsing.

pub mod cache;
pub mod fetcher;
pub mod parsers;
pub mod rate_limiter;

pub use cache::PageCache;
pub use fetcher::{CachedFetcher, HttpFetcher, HttpFetcherConfig, PageFetcher};
pub use parsers::MobPage;
pub use rate_limiter::RateLimiter;

/// Base URL of the wiki
pub const BASE_URL: &str = "https://wiki1.mw2.wiki";

/// User agent sent with every request
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Build NPC detail page URL
pub fn detail_url(base_url: &str, detail_path: &str) -> String {
    format!(
        "{}/npc/{}/live",
        base_url.trim_end_matches('/'),
        detail_path.trim_matches('/')
    )
}
