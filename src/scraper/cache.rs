//! File-based page cache with TTL support.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cache entry with timestamp
#[derive(Serialize, Deserialize)]
struct CacheEntry {
    html: String,
    cached_at: DateTime<Utc>,
}

/// Raw detail pages keyed by their detail path
pub struct PageCache {
    base_dir: PathBuf,
    ttl: Duration,
}

impl PageCache {
    /// Create a new cache with the given base directory
    pub fn new(base_dir: PathBuf, ttl: Duration) -> Self {
        Self { base_dir, ttl }
    }

    /// Get cache file path for a key
    fn cache_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{}.json", file_name))
    }

    /// Get cached page if present and fresh
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let path = self.cache_path(key);

        if !path.exists() {
            return None;
        }

        let content = std::fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = serde_json::from_str(&content).ok()?;

        // Check if expired
        if now - entry.cached_at > self.ttl {
            let _ = std::fs::remove_file(&path);
            return None;
        }

        Some(entry.html)
    }

    /// Store a page
    pub fn set(&self, key: &str, html: &str, now: DateTime<Utc>) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;

        let entry = CacheEntry {
            html: html.to_string(),
            cached_at: now,
        };

        let content = serde_json::to_string(&entry)?;
        std::fs::write(self.cache_path(key), content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_and_expiry() {
        let dir = TempDir::new().unwrap();
        let cache = PageCache::new(dir.path().join("pages"), Duration::hours(1));
        let now = Utc::now();

        cache.set("20537-elder-red-keltir", "<html>ok</html>", now).unwrap();
        assert_eq!(
            cache.get("20537-elder-red-keltir", now).as_deref(),
            Some("<html>ok</html>")
        );

        let later = now + Duration::hours(2);
        assert!(cache.get("20537-elder-red-keltir", later).is_none());
        // Expired entry is removed
        assert!(cache.get("20537-elder-red-keltir", now).is_none());
    }

    #[test]
    fn test_keys_are_sanitized() {
        let dir = TempDir::new().unwrap();
        let cache = PageCache::new(dir.path().to_path_buf(), Duration::hours(1));
        let now = Utc::now();

        cache.set("a/../b", "x", now).unwrap();
        assert_eq!(cache.get("a/../b", now).as_deref(), Some("x"));
        assert!(dir.path().join("a____b.json").exists());
    }
}
