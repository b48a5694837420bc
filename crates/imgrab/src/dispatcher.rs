//! # Batch dispatch
//!
//! [`BatchFetcher`] turns a list of URLs into [`DownloadRequest`]s, hands them
//! to the scheduler for the chosen [`ExecutionStrategy`], and times the whole
//! run. It is a blocking call and must not be made from inside an async
//! runtime; the async strategy builds its own single-threaded one.

use std::time::Instant;

use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::error::DownloadError;
use crate::model::{BatchReport, DownloadRequest};
use crate::strategy::{
    CooperativeScheduler, ExecutionStrategy, ProcessScheduler, Scheduler, ThreadScheduler,
    WorkerProgram,
};

pub struct BatchFetcher {
    config: FetchConfig,
    worker_program: Option<WorkerProgram>,
}

impl BatchFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            worker_program: None,
        }
    }

    /// Use `program` for process-strategy workers instead of the running executable.
    pub fn with_worker_program(mut self, program: WorkerProgram) -> Self {
        self.worker_program = Some(program);
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn scheduler(&self, strategy: ExecutionStrategy) -> Result<Box<dyn Scheduler>, DownloadError> {
        let scheduler: Box<dyn Scheduler> = match strategy {
            ExecutionStrategy::Thread => Box::new(ThreadScheduler::new(self.config.clone())?),
            ExecutionStrategy::Process => {
                let program = match &self.worker_program {
                    Some(program) => program.clone(),
                    None => WorkerProgram::current_exe()?,
                };
                Box::new(ProcessScheduler::new(self.config.clone(), program))
            }
            ExecutionStrategy::Async => Box::new(CooperativeScheduler::new(self.config.clone())),
        };
        Ok(scheduler)
    }

    /// Fetch every URL under `strategy`, returning once all of them are done.
    ///
    /// Per-item failures are reported in the [`BatchReport`]; `Err` means the
    /// batch could not be scheduled at all.
    pub fn run<S: AsRef<str>>(
        &self,
        strategy: ExecutionStrategy,
        urls: &[S],
    ) -> Result<BatchReport, DownloadError> {
        if urls.is_empty() {
            return Err(DownloadError::EmptyBatch);
        }
        let requests = DownloadRequest::from_urls(urls);

        info!(
            strategy = %strategy,
            items = requests.len(),
            output_dir = %self.config.output_dir.display(),
            "Starting batch"
        );

        let start = Instant::now();
        let scheduler = self.scheduler(strategy)?;
        let mut outcomes = scheduler.schedule(&requests);
        let total_elapsed = start.elapsed();

        if outcomes.len() != requests.len() {
            warn!(
                expected = requests.len(),
                got = outcomes.len(),
                "Scheduler returned an unexpected number of outcomes"
            );
        }
        outcomes.sort_by_key(|outcome| outcome.index);

        let report = BatchReport {
            strategy,
            outcomes,
            total_elapsed,
        };
        info!(
            strategy = %strategy,
            succeeded = report.succeeded().count(),
            failed = report.failure_count(),
            elapsed_ms = total_elapsed.as_millis() as u64,
            "Batch finished"
        );
        Ok(report)
    }
}
