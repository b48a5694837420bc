//! Worker-process side of the multi-process strategy.
//!
//! A child is the `imgrab` binary re-invoked with [`WORKER_SUBCOMMAND`]. It
//! performs one blocking fetch-and-store and prints exactly one JSON
//! [`WorkerReport`] line on stdout, which the parent parses back into an
//! [`ItemOutcome`](crate::ItemOutcome).

use std::ffi::OsString;

use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::client::create_blocking_client;
use crate::config::FetchConfig;
use crate::error::DownloadError;
use crate::fetch::fetch_blocking;
use crate::model::{DownloadFailure, DownloadResult};

/// Hidden subcommand name the parent passes to its worker program.
pub const WORKER_SUBCOMMAND: &str = "__worker";

/// Environment variable carrying the parent's log filter to its workers.
pub const WORKER_LOG_ENV: &str = "IMGRAB_WORKER_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkerReport {
    Ok { result: DownloadResult },
    Failed { failure: DownloadFailure },
}

impl WorkerReport {
    pub fn is_ok(&self) -> bool {
        matches!(self, WorkerReport::Ok { .. })
    }

    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Run one fetch-and-store in this process.
pub fn run_worker(config: &FetchConfig, url: &str) -> WorkerReport {
    let result = create_blocking_client(config).and_then(|client| fetch_blocking(&client, url, config));
    match result {
        Ok(result) => WorkerReport::Ok { result },
        Err(e) => WorkerReport::Failed {
            failure: DownloadFailure::new(url, &e),
        },
    }
}

/// Parse the report a worker printed. The last non-empty line wins.
pub fn parse_report(stdout: &[u8]) -> Result<WorkerReport, DownloadError> {
    let text = String::from_utf8_lossy(stdout);
    let line = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| DownloadError::worker("worker printed no report"))?;

    serde_json::from_str(line.trim())
        .map_err(|e| DownloadError::worker(format!("unreadable worker report `{line}`: {e}")))
}

/// Arguments that hand `config` and `url` to a worker process.
pub fn worker_args(config: &FetchConfig, url: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "--output-dir".into(),
        config.output_dir.clone().into_os_string(),
        "--timeout-ms".into(),
        config.timeout.as_millis().to_string().into(),
        "--connect-timeout-ms".into(),
        config.connect_timeout.as_millis().to_string().into(),
        "--user-agent".into(),
        config.user_agent.clone().into(),
    ];

    for (name, value) in config.headers.iter() {
        match value.to_str() {
            Ok(value) => {
                args.push("--header".into());
                args.push(format!("{name}: {value}").into());
            }
            Err(_) => warn!(header = %name, "Skipping non-text header for worker process"),
        }
    }

    if config.accept_error_status {
        args.push("--keep-error-bodies".into());
    }
    if !config.follow_redirects {
        args.push("--no-redirects".into());
    }
    if let Some(proxy) = &config.proxy {
        args.push("--proxy".into());
        args.push(proxy.url.clone().into());
        args.push("--proxy-type".into());
        args.push(proxy.proxy_type.as_str().into());
    }

    args.push("--".into());
    args.push(url.into());
    args
}

/// Parse a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid header `{raw}`, expected `Name: value`"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| format!("invalid header name in `{raw}`: {e}"))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| format!("invalid header value in `{raw}`: {e}"))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::proxy::{ProxyConfig, ProxyType};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn report_json_shape() {
        let report = WorkerReport::Failed {
            failure: DownloadFailure {
                url: "http://h/a.png".to_string(),
                kind: ErrorKind::HttpStatus,
                message: "request failed".to_string(),
            },
        };
        let json = report.to_json_line().unwrap();
        assert_eq!(
            json,
            r#"{"status":"failed","failure":{"url":"http://h/a.png","kind":"http_status","message":"request failed"}}"#
        );
        assert_eq!(parse_report(json.as_bytes()).unwrap(), report);
    }

    #[test]
    fn ok_report_survives_the_pipe() {
        let report = WorkerReport::Ok {
            result: DownloadResult {
                url: "http://h/a.png".to_string(),
                filename: "a.png".to_string(),
                path: PathBuf::from("out/a.png"),
                bytes: 42,
                status: 200,
                elapsed: Duration::from_millis(1234),
            },
        };
        let mut stdout = b"some stray output\n".to_vec();
        stdout.extend_from_slice(report.to_json_line().unwrap().as_bytes());
        stdout.extend_from_slice(b"\n\n");

        assert_eq!(parse_report(&stdout).unwrap(), report);
    }

    #[test]
    fn empty_or_garbled_output_is_a_worker_error() {
        assert!(matches!(
            parse_report(b""),
            Err(DownloadError::Worker { .. })
        ));
        assert!(matches!(
            parse_report(b"panicked at src/main.rs\n"),
            Err(DownloadError::Worker { .. })
        ));
    }

    #[test]
    fn worker_args_carry_config() {
        let config = FetchConfig::builder()
            .output_dir("out")
            .timeout(Duration::from_millis(2500))
            .accept_error_status(true)
            .proxy(Some(ProxyConfig {
                url: "127.0.0.1:1080".to_string(),
                proxy_type: ProxyType::Socks5,
            }))
            .build();

        let args: Vec<String> = worker_args(&config, "-weird/a.png")
            .into_iter()
            .map(|a| a.into_string().unwrap())
            .collect();

        let value_of = |flag: &str| {
            let pos = args.iter().position(|a| a == flag).unwrap();
            args[pos + 1].clone()
        };
        assert_eq!(value_of("--output-dir"), "out");
        assert_eq!(value_of("--timeout-ms"), "2500");
        assert_eq!(value_of("--connect-timeout-ms"), "10000");
        assert_eq!(value_of("--proxy-type"), "socks5");
        assert!(args.contains(&"--keep-error-bodies".to_string()));
        assert!(args.iter().any(|a| a.starts_with("accept: ")));
        assert_eq!(&args[args.len() - 2..], ["--", "-weird/a.png"]);
    }

    #[test]
    fn header_argument_parsing() {
        let (name, value) = parse_header("X-Token:  abc ").unwrap();
        assert_eq!(name.as_str(), "x-token");
        assert_eq!(value, "abc");
        assert!(parse_header("no-colon").is_err());
    }
}
