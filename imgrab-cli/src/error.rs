use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Download(#[from] imgrab_engine::DownloadError),

    #[error("failed to encode worker report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{failed} of {total} downloads failed")]
    BatchFailed { failed: usize, total: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
