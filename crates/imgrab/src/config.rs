use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::proxy::ProxyConfig;

pub const DEFAULT_USER_AGENT: &str = concat!("imgrab/", env!("CARGO_PKG_VERSION"));

/// Configurable options shared by every scheduling strategy
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Directory the derived file names are resolved against
    pub output_dir: PathBuf,

    /// Overall timeout for a single request, including the body.
    /// `Duration::ZERO` disables it.
    pub timeout: Duration,

    /// Connection timeout (time to establish the initial connection).
    /// `Duration::ZERO` disables it.
    pub connect_timeout: Duration,

    /// Upper bound on items in flight. `None` sizes the pool to the batch.
    pub max_workers: Option<usize>,

    /// Write non-2xx response bodies to disk instead of failing the item
    pub accept_error_status: bool,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,

    /// Proxy configuration (optional)
    pub proxy: Option<ProxyConfig>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_workers: None,
            accept_error_status: false,
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: FetchConfig::get_default_headers(),
            proxy: None,
        }
    }
}

impl FetchConfig {
    pub fn builder() -> crate::builder::FetchConfigBuilder {
        crate::builder::FetchConfigBuilder::new()
    }

    /// Number of concurrent workers to use for a batch of `batch_len` items.
    ///
    /// Always at least one, never more than the batch itself.
    pub fn worker_count(&self, batch_len: usize) -> usize {
        let cap = self.max_workers.unwrap_or(batch_len).max(1);
        cap.min(batch_len.max(1))
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/*,*/*;q=0.8"),
        );

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );

        default_headers
    }
}
