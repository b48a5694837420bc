use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("cannot derive a file name from `{url}`: {reason}")]
    InvalidFilename { url: String, reason: String },

    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("operation timed out: {reason}")]
    Timeout { reason: String },

    #[error("proxy configuration error: {reason}")]
    ProxyConfiguration { reason: String },

    #[error("no URLs were supplied")]
    EmptyBatch,

    #[error("runtime error: {reason}")]
    Runtime { reason: String },

    #[error("worker process error: {reason}")]
    Worker { reason: String },
}

impl DownloadError {
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_filename(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilename {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn runtime(reason: impl Into<String>) -> Self {
        Self::Runtime {
            reason: reason.into(),
        }
    }

    pub fn worker(reason: impl Into<String>) -> Self {
        Self::Worker {
            reason: reason.into(),
        }
    }

    /// Classify a transport error, splitting timeouts out of generic network faults.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                reason: err.to_string(),
            }
        } else {
            Self::Network { source: err }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl { .. } | Self::InvalidFilename { .. } | Self::EmptyBatch => {
                ErrorKind::InvalidInput
            }
            Self::Network { .. } | Self::ProxyConfiguration { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::Io { .. } => ErrorKind::Filesystem,
            Self::Runtime { .. } | Self::Worker { .. } => ErrorKind::Worker,
        }
    }
}

/// Serializable failure category, carried across the worker process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Network,
    Timeout,
    HttpStatus,
    Filesystem,
    Worker,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::HttpStatus => "http status",
            ErrorKind::Filesystem => "filesystem",
            ErrorKind::Worker => "worker",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_error_taxonomy() {
        assert_eq!(
            DownloadError::invalid_filename("http://h/", "empty").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            DownloadError::http_status(StatusCode::NOT_FOUND, "http://h/a.png").kind(),
            ErrorKind::HttpStatus
        );
        assert_eq!(
            DownloadError::io("a.png", std::io::Error::other("disk full")).kind(),
            ErrorKind::Filesystem
        );
        assert_eq!(DownloadError::EmptyBatch.kind(), ErrorKind::InvalidInput);
        assert_eq!(DownloadError::worker("exited").kind(), ErrorKind::Worker);
    }

    #[test]
    fn http_status_message_names_url() {
        let err = DownloadError::http_status(StatusCode::NOT_FOUND, "http://h/a.png");
        assert_eq!(
            err.to_string(),
            "request failed with HTTP 404 Not Found for http://h/a.png"
        );
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::HttpStatus).unwrap();
        assert_eq!(json, "\"http_status\"");
    }
}
