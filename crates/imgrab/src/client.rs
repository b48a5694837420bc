//! HTTP client construction for the async and blocking fetch paths.
//!
//! Both clients are built from the same [`FetchConfig`] so every strategy sends
//! identical requests and applies the same timeouts.

use reqwest::redirect::Policy;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::DownloadError;
use crate::proxy::build_proxy_from_config;

fn redirect_policy(config: &FetchConfig) -> Policy {
    if config.follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    }
}

/// Create an async reqwest Client with the provided configuration
pub fn create_client(config: &FetchConfig) -> Result<reqwest::Client, DownloadError> {
    let mut client_builder = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(redirect_policy(config));

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if let Some(proxy_config) = &config.proxy {
        client_builder = client_builder.proxy(build_proxy_from_config(proxy_config)?);
        info!(proxy_url = %proxy_config.url, "Using explicitly configured proxy");
    }

    debug!(timeout = ?config.timeout, "Built async HTTP client");
    client_builder.build().map_err(DownloadError::from)
}

/// Create a blocking reqwest Client with the provided configuration.
///
/// Must not be called from inside an async runtime.
pub fn create_blocking_client(
    config: &FetchConfig,
) -> Result<reqwest::blocking::Client, DownloadError> {
    let mut client_builder = reqwest::blocking::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(redirect_policy(config));

    // The blocking builder applies a 30s default unless told otherwise.
    client_builder = if config.timeout.is_zero() {
        client_builder.timeout(None)
    } else {
        client_builder.timeout(config.timeout)
    };

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if let Some(proxy_config) = &config.proxy {
        client_builder = client_builder.proxy(build_proxy_from_config(proxy_config)?);
        info!(proxy_url = %proxy_config.url, "Using explicitly configured proxy");
    }

    debug!(timeout = ?config.timeout, "Built blocking HTTP client");
    client_builder.build().map_err(DownloadError::from)
}
