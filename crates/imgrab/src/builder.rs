//! Fluent construction of [`FetchConfig`].

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::FetchConfig;
use crate::proxy::ProxyConfig;

#[derive(Debug, Clone, Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl From<FetchConfig> for FetchConfigBuilder {
    fn from(config: FetchConfig) -> Self {
        Self { config }
    }
}

impl FetchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn max_workers(mut self, workers: Option<usize>) -> Self {
        self.config.max_workers = workers;
        self
    }

    pub fn accept_error_status(mut self, accept: bool) -> Self {
        self.config.accept_error_status = accept;
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a header, replacing any default with the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.config.headers.insert(name, value);
        self
    }

    /// Add user headers. Every value of a repeated name is kept; a name that is
    /// also a default header replaces the default.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (HeaderName, HeaderValue)>) -> Self {
        let mut extra = HeaderMap::new();
        for (name, value) in headers {
            extra.append(name, value);
        }
        self.config.headers.extend(extra);
        self
    }

    pub fn proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.config.proxy = proxy;
        self
    }

    pub fn build(self) -> FetchConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = FetchConfig::builder()
            .output_dir("/tmp/out")
            .timeout(Duration::from_secs(5))
            .max_workers(Some(3))
            .accept_error_status(true)
            .user_agent("test-agent")
            .header(
                reqwest::header::ACCEPT,
                HeaderValue::from_static("image/png"),
            )
            .build();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_workers, Some(3));
        assert!(config.accept_error_status);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.headers[reqwest::header::ACCEPT], "image/png");
        assert!(config.headers.contains_key(reqwest::header::CONNECTION));
    }

    #[test]
    fn repeated_user_headers_are_all_kept() {
        let tag = HeaderName::from_static("x-tag");
        let config = FetchConfig::builder()
            .headers([
                (tag.clone(), HeaderValue::from_static("a")),
                (tag.clone(), HeaderValue::from_static("b")),
                (reqwest::header::ACCEPT, HeaderValue::from_static("image/png")),
            ])
            .build();

        let tags: Vec<_> = config.headers.get_all(&tag).iter().collect();
        assert_eq!(tags, ["a", "b"]);
        let accept: Vec<_> = config.headers.get_all(reqwest::header::ACCEPT).iter().collect();
        assert_eq!(accept, ["image/png"]);
        assert!(config.headers.contains_key(reqwest::header::CONNECTION));
    }
}
