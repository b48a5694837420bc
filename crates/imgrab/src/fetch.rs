//! # Fetch and store
//!
//! The single per-URL operation every scheduler drives: derive the file name,
//! GET the URL, and write the body to `<output_dir>/<file name>`, replacing any
//! existing file. The blocking flavour buffers the whole body before writing;
//! the async flavour writes each chunk as it arrives.
//!
//! Bodies are staged in a temporary file next to the target and renamed into
//! place once complete, so two fetches of the same name never interleave and a
//! failed fetch leaves the target untouched.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::StreamExt;
use humansize::{BINARY, format_size};
use reqwest::StatusCode;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::error::DownloadError;
use crate::filename::derive_filename;
use crate::model::DownloadResult;

/// Validate `url` and resolve where its body will be written.
fn prepare(url: &str, config: &FetchConfig) -> Result<(Url, String, PathBuf), DownloadError> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::invalid_url(url, e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(DownloadError::invalid_url(
            url,
            format!("unsupported scheme `{}`", parsed.scheme()),
        ));
    }

    let filename = derive_filename(url)?;
    let path = config.output_dir.join(&filename);
    Ok((parsed, filename, path))
}

fn check_status(status: StatusCode, url: &str, config: &FetchConfig) -> Result<(), DownloadError> {
    if status.is_success() {
        return Ok(());
    }
    if config.accept_error_status {
        warn!(url, %status, "Keeping body of unsuccessful response");
        return Ok(());
    }
    Err(DownloadError::http_status(status, url))
}

/// Unique staging file in the output directory, removed on drop unless committed.
fn staging_file(config: &FetchConfig) -> Result<NamedTempFile, DownloadError> {
    NamedTempFile::new_in(&config.output_dir).map_err(|e| DownloadError::io(&config.output_dir, e))
}

/// Atomically move a complete body onto `path`.
fn commit(staged: NamedTempFile, path: &Path) -> Result<(), DownloadError> {
    staged
        .persist(path)
        .map(|_| ())
        .map_err(|e| DownloadError::io(path, e.error))
}

fn finish(
    url: &str,
    filename: String,
    path: PathBuf,
    bytes: u64,
    status: StatusCode,
    start: Instant,
) -> DownloadResult {
    let elapsed = start.elapsed();
    info!(
        url,
        file = %path.display(),
        size = %format_size(bytes, BINARY),
        elapsed_ms = elapsed.as_millis() as u64,
        "Stored download"
    );
    DownloadResult {
        url: url.to_string(),
        filename,
        path,
        bytes,
        status: status.as_u16(),
        elapsed,
    }
}

/// Fetch `url` with a blocking client and store the body.
#[instrument(skip(client, config), level = "debug")]
pub fn fetch_blocking(
    client: &reqwest::blocking::Client,
    url: &str,
    config: &FetchConfig,
) -> Result<DownloadResult, DownloadError> {
    let start = Instant::now();
    let (parsed, filename, path) = prepare(url, config)?;

    debug!(url, "Sending blocking request");
    let response = client
        .get(parsed)
        .send()
        .map_err(DownloadError::from_transport)?;
    let status = response.status();
    check_status(status, url, config)?;

    let body = response.bytes().map_err(DownloadError::from_transport)?;
    let mut staged = staging_file(config)?;
    staged
        .write_all(&body)
        .map_err(|e| DownloadError::io(staged.path(), e))?;
    commit(staged, &path)?;

    Ok(finish(url, filename, path, body.len() as u64, status, start))
}

/// Fetch `url` with an async client, streaming the body to disk chunk by chunk.
///
/// Chunk writes are plain blocking writes so a single-threaded runtime only
/// ever suspends while waiting on the network.
#[instrument(skip(client, config), level = "debug")]
pub async fn fetch_async(
    client: &reqwest::Client,
    url: &str,
    config: &FetchConfig,
) -> Result<DownloadResult, DownloadError> {
    let start = Instant::now();
    let (parsed, filename, path) = prepare(url, config)?;

    debug!(url, "Sending async request");
    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(DownloadError::from_transport)?;
    let status = response.status();
    check_status(status, url, config)?;

    let mut staged = staging_file(config)?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(DownloadError::from_transport)?;
        staged
            .write_all(&chunk)
            .map_err(|e| DownloadError::io(staged.path(), e))?;
        written += chunk.len() as u64;
    }
    staged
        .flush()
        .map_err(|e| DownloadError::io(staged.path(), e))?;
    commit(staged, &path)?;

    Ok(finish(url, filename, path, written, status, start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{create_blocking_client, create_client};
    use crate::test_support::StubServer;

    fn config_for(dir: &Path) -> FetchConfig {
        FetchConfig::builder().output_dir(dir).build()
    }

    #[test]
    fn blocking_fetch_writes_body() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let client = create_blocking_client(&config).unwrap();

        let url = server.url("/images/a.png");
        let result = fetch_blocking(&client, &url, &config).unwrap();

        assert_eq!(result.filename, "a.png");
        assert_eq!(result.status, 200);
        let stored = std::fs::read(dir.path().join("a.png")).unwrap();
        assert_eq!(stored, StubServer::image_body("a.png"));
        assert_eq!(result.bytes, stored.len() as u64);
    }

    #[test]
    fn blocking_fetch_overwrites_existing_file() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"stale content that is longer").unwrap();
        let config = config_for(dir.path());
        let client = create_blocking_client(&config).unwrap();

        fetch_blocking(&client, &server.url("/images/b.png"), &config).unwrap();

        let stored = std::fs::read(dir.path().join("b.png")).unwrap();
        assert_eq!(stored, StubServer::image_body("b.png"));
    }

    #[test]
    fn non_success_status_is_rejected_by_default() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let client = create_blocking_client(&config).unwrap();

        let err = fetch_blocking(&client, &server.url("/missing/c.png"), &config).unwrap_err();

        assert!(matches!(
            err,
            DownloadError::HttpStatus { status, .. } if status == StatusCode::NOT_FOUND
        ));
        assert!(!dir.path().join("c.png").exists());
    }

    #[test]
    fn non_success_body_is_kept_when_accepted() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let config = FetchConfig::builder()
            .output_dir(dir.path())
            .accept_error_status(true)
            .build();
        let client = create_blocking_client(&config).unwrap();

        let result = fetch_blocking(&client, &server.url("/missing/c.png"), &config).unwrap();

        assert_eq!(result.status, 404);
        let stored = std::fs::read(dir.path().join("c.png")).unwrap();
        assert_eq!(stored, StubServer::NOT_FOUND_BODY.as_bytes());
    }

    #[test]
    fn invalid_url_fails_before_request() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let client = create_blocking_client(&config).unwrap();

        let err = fetch_blocking(&client, "ftp://host/a.png", &config).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl { .. }));

        let err = fetch_blocking(&client, "http://host/dir/", &config).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidFilename { .. }));
    }

    #[test]
    fn missing_output_dir_is_a_filesystem_error() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("does-not-exist"));
        let client = create_blocking_client(&config).unwrap();

        let err = fetch_blocking(&client, &server.url("/images/a.png"), &config).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Filesystem);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn async_fetch_streams_large_body() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let client = create_client(&config).unwrap();

        let result = fetch_async(&client, &server.url("/large/big.bin"), &config)
            .await
            .unwrap();

        let stored = std::fs::read(dir.path().join("big.bin")).unwrap();
        assert_eq!(stored, StubServer::large_body());
        assert_eq!(result.bytes, StubServer::LARGE_BODY_LEN as u64);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn async_fetch_reports_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let client = create_client(&config).unwrap();

        let err = fetch_async(&client, "http://127.0.0.1:1/a.png", &config)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::Network);
        assert!(!dir.path().join("a.png").exists());
    }

    #[rstest::rstest]
    #[case::blocking(false)]
    #[case::streaming(true)]
    fn aborted_body_leaves_existing_file_alone(#[case] streaming: bool) {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("kept.bin");
        std::fs::write(&target, b"complete earlier body").unwrap();
        let config = config_for(dir.path());
        let url = server.url("/broken/kept.bin");

        let result = if streaming {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let client = create_client(&config).unwrap();
            runtime.block_on(fetch_async(&client, &url, &config))
        } else {
            let client = create_blocking_client(&config).unwrap();
            fetch_blocking(&client, &url, &config)
        };

        assert!(result.is_err(), "{result:?}");
        assert_eq!(std::fs::read(&target).unwrap(), b"complete earlier body");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
