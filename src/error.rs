//! Error types for fetching and collection.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while retrieving a single wiki page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS lookup failed. Not retried.
    #[error("host not found: {0}")]
    HostNotFound(String),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Whether another attempt has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::HostNotFound(_) => false,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Timeout(_) | FetchError::Transport(_) => true,
        }
    }

    /// Classify a reqwest error, pulling DNS failures out of the source chain.
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout(url.to_string());
        }
        if err.is_connect() && is_dns_failure(&err) {
            return FetchError::HostNotFound(url.to_string());
        }
        if let Some(status) = err.status() {
            return FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            };
        }
        FetchError::Transport(err)
    }
}

fn is_dns_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_lowercase();
        if text.contains("dns error")
            || text.contains("failed to lookup address")
            || text.contains("name or service not known")
            || text.contains("no such host")
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// Errors that abort a collection, merge or analysis run.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A required input file does not exist.
    #[error("required input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("invalid JSON in {}: {source}", path.display())]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CollectError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CollectError::Io {
            path: path.into(),
            source,
        }
    }
}
