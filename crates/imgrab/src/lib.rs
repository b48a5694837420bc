//! # imgrab engine
//!
//! Fetches a batch of URLs over HTTP and stores each body in a file named after
//! the URL's final path segment, under one of three scheduling strategies:
//! OS threads, worker processes, or a single-threaded cooperative runtime.
//!
//! ```no_run
//! use imgrab_engine::{BatchFetcher, ExecutionStrategy, FetchConfig};
//!
//! let config = FetchConfig::builder().output_dir("downloads").build();
//! let report = BatchFetcher::new(config)
//!     .run(ExecutionStrategy::Async, &["https://example.com/images/image1.jpg"])
//!     .unwrap();
//! println!("Total time taken: {:.2} seconds", report.total_elapsed.as_secs_f64());
//! ```
//!
//! ## License
//!
//! MIT License
//!
//! ## Authors
//!
//! - hua0512
//!

pub mod builder;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fetch;
pub mod filename;
pub mod model;
pub mod proxy;
pub mod strategy;
pub mod worker;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use builder::FetchConfigBuilder;
pub use config::{DEFAULT_USER_AGENT, FetchConfig};
pub use dispatcher::BatchFetcher;
pub use error::{DownloadError, ErrorKind};
pub use fetch::{fetch_async, fetch_blocking};
pub use filename::derive_filename;
pub use model::{BatchReport, DownloadFailure, DownloadRequest, DownloadResult, ItemOutcome};
pub use proxy::{ProxyConfig, ProxyType};
pub use strategy::{
    CooperativeScheduler, ExecutionStrategy, ProcessScheduler, Scheduler, ThreadScheduler,
    WorkerProgram,
};
pub use worker::{WORKER_LOG_ENV, WORKER_SUBCOMMAND, WorkerReport};

pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
