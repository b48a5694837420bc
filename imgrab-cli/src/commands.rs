use crate::{
    cli::{StrategyArg, WorkerArgs},
    error::{AppError, Result},
    output::OutputManager,
};
use imgrab_engine::{
    BatchFetcher, ExecutionStrategy, FetchConfig, WORKER_LOG_ENV, WorkerProgram, worker,
};
use std::io::{self, Write};
use std::time::Instant;
use tracing::{debug, info};

pub struct CommandExecutor {
    config: FetchConfig,
    output: OutputManager,
    worker_log: Option<String>,
}

impl CommandExecutor {
    pub fn new(config: FetchConfig, output: OutputManager) -> Self {
        Self {
            config,
            output,
            worker_log: None,
        }
    }

    /// Log filter for process-strategy workers.
    pub fn with_worker_log(mut self, filter: impl Into<String>) -> Self {
        self.worker_log = Some(filter.into());
        self
    }

    fn fetcher(&self, strategies: &[ExecutionStrategy]) -> Result<BatchFetcher> {
        let fetcher = BatchFetcher::new(self.config.clone());
        if !strategies.contains(&ExecutionStrategy::Process) {
            return Ok(fetcher);
        }

        let mut program = WorkerProgram::current_exe()?;
        if let Some(filter) = &self.worker_log {
            program = program.env(WORKER_LOG_ENV, filter);
        }
        Ok(fetcher.with_worker_program(program))
    }

    fn validate_output_dir(&self) -> Result<()> {
        let dir = &self.config.output_dir;
        if !dir.is_dir() {
            return Err(AppError::InvalidInput(format!(
                "output directory `{}` does not exist",
                dir.display()
            )));
        }
        Ok(())
    }

    /// Download `urls` under the selected strategy (or each strategy in turn).
    ///
    /// Returns [`AppError::BatchFailed`] after printing the summary if any
    /// item failed.
    pub fn download(&self, urls: &[String], strategy: StrategyArg) -> Result<()> {
        self.validate_output_dir()?;

        let strategies = strategy.strategies();
        let fetcher = self.fetcher(&strategies)?;
        let compare = strategies.len() > 1;

        let start = Instant::now();
        let mut total_elapsed = start.elapsed();
        let mut failed = 0;
        let mut attempted = 0;

        for strategy in strategies {
            if compare {
                writeln!(io::stdout(), "{}", self.output.format_strategy_header(strategy))?;
            }

            let report = fetcher.run(strategy, urls)?;
            self.output
                .print_report(&report, &mut io::stdout().lock(), &mut io::stderr().lock())?;

            if compare {
                writeln!(
                    io::stdout(),
                    "{}",
                    self.output.format_strategy_elapsed(report.total_elapsed)
                )?;
            }

            debug!(
                strategy = %strategy,
                bytes = report.total_bytes(),
                "Strategy finished"
            );
            failed += report.failure_count();
            attempted += report.outcomes.len();
            total_elapsed = report.total_elapsed;
        }

        if compare {
            total_elapsed = start.elapsed();
        }

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", self.output.format_total(total_elapsed))?;
        stdout.flush()?;

        if failed > 0 {
            return Err(AppError::BatchFailed {
                failed,
                total: attempted,
            });
        }
        info!(items = attempted, "All downloads succeeded");
        Ok(())
    }
}

/// Worker mode: fetch one URL and print the JSON report for the parent.
///
/// Returns whether the fetch succeeded.
pub fn run_worker(args: &WorkerArgs) -> Result<bool> {
    let config = args.fetch_config();
    let report = worker::run_worker(&config, &args.url);

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", report.to_json_line()?)?;
    stdout.flush()?;

    Ok(report.is_ok())
}
