//! Request, per-item outcome and batch report types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DownloadError, ErrorKind};
use crate::strategy::ExecutionStrategy;

/// One URL submitted to a batch, tagged with its submission position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub index: usize,
    pub url: String,
}

impl DownloadRequest {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }

    /// Number a list of URLs in submission order.
    pub fn from_urls<S: AsRef<str>>(urls: &[S]) -> Vec<Self> {
        urls.iter()
            .enumerate()
            .map(|(index, url)| Self::new(index, url.as_ref()))
            .collect()
    }
}

/// A completed fetch-and-store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub url: String,
    pub filename: String,
    pub path: PathBuf,
    pub bytes: u64,
    pub status: u16,
    pub elapsed: Duration,
}

/// A fetch-and-store that reached the failed terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFailure {
    pub url: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl DownloadFailure {
    pub fn new(url: impl Into<String>, error: &DownloadError) -> Self {
        Self {
            url: url.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for DownloadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to download {}: {}", self.url, self.message)
    }
}

/// Terminal state of one request, whatever strategy produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub index: usize,
    pub result: Result<DownloadResult, DownloadFailure>,
}

impl ItemOutcome {
    pub fn from_result(
        request: &DownloadRequest,
        result: Result<DownloadResult, DownloadError>,
    ) -> Self {
        Self {
            index: request.index,
            result: result.map_err(|e| DownloadFailure::new(&request.url, &e)),
        }
    }

    pub fn failed(request: &DownloadRequest, error: &DownloadError) -> Self {
        Self {
            index: request.index,
            result: Err(DownloadFailure::new(&request.url, error)),
        }
    }

    pub fn url(&self) -> &str {
        match &self.result {
            Ok(result) => &result.url,
            Err(failure) => &failure.url,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a dispatch produced: one outcome per request plus total time.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub strategy: ExecutionStrategy,
    /// Sorted by submission index.
    pub outcomes: Vec<ItemOutcome>,
    /// Wall-clock time around the whole dispatch.
    pub total_elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &DownloadResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &DownloadFailure> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn total_bytes(&self) -> u64 {
        self.succeeded().map(|r| r.bytes).sum()
    }

    pub fn max_item_elapsed(&self) -> Duration {
        self.succeeded()
            .map(|r| r.elapsed)
            .max()
            .unwrap_or(Duration::ZERO)
    }
}
