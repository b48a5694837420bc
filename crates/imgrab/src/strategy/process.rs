use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::Stdio;

use futures::StreamExt;
use tracing::{debug, warn};

use super::Scheduler;
use crate::config::FetchConfig;
use crate::error::DownloadError;
use crate::model::{DownloadRequest, ItemOutcome};
use crate::worker::{WORKER_SUBCOMMAND, WorkerReport, parse_report, worker_args};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// The executable (plus leading arguments) a worker process is started with.
///
/// The per-item arguments from [`worker_args`] are appended after `args`;
/// `envs` are set on every child on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerProgram {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub envs: Vec<(OsString, OsString)>,
}

impl WorkerProgram {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// The running executable in worker mode.
    pub fn current_exe() -> Result<Self, DownloadError> {
        let exe = std::env::current_exe()
            .map_err(|e| DownloadError::worker(format!("cannot locate own executable: {e}")))?;
        Ok(Self::new(exe).arg(WORKER_SUBCOMMAND))
    }
}

/// Runs each request in its own child process.
///
/// Children share nothing with the parent but the filesystem; each one reports
/// its outcome as a JSON line on stdout. At most `worker_count` children are
/// alive at once.
pub struct ProcessScheduler {
    config: FetchConfig,
    program: WorkerProgram,
}

impl ProcessScheduler {
    pub fn new(config: FetchConfig, program: WorkerProgram) -> Self {
        Self { config, program }
    }

    fn command_for(&self, request: &DownloadRequest) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program.program);
        cmd.args(&self.program.args)
            .args(worker_args(&self.config, &request.url))
            .envs(self.program.envs.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }

    async fn run_child(&self, request: &DownloadRequest) -> ItemOutcome {
        debug!(index = request.index, url = %request.url, "Spawning worker process");

        let output = match self.command_for(request).output().await {
            Ok(output) => output,
            Err(e) => {
                let error = DownloadError::worker(format!(
                    "failed to run {}: {e}",
                    self.program.program.display()
                ));
                return ItemOutcome::failed(request, &error);
            }
        };

        match parse_report(&output.stdout) {
            Ok(WorkerReport::Ok { result }) => ItemOutcome {
                index: request.index,
                result: Ok(result),
            },
            Ok(WorkerReport::Failed { failure }) => ItemOutcome {
                index: request.index,
                result: Err(failure),
            },
            Err(e) => {
                warn!(url = %request.url, status = %output.status, "Worker exited without a report");
                let error = DownloadError::worker(format!("exited with {}: {e}", output.status));
                ItemOutcome::failed(request, &error)
            }
        }
    }
}

impl Scheduler for ProcessScheduler {
    fn schedule(&self, requests: &[DownloadRequest]) -> Vec<ItemOutcome> {
        let workers = self.config.worker_count(requests.len());
        debug!(workers, items = requests.len(), "Starting worker processes");

        // The runtime only supervises children; the work happens in them.
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                let error = DownloadError::runtime(e.to_string());
                return requests
                    .iter()
                    .map(|request| ItemOutcome::failed(request, &error))
                    .collect();
            }
        };

        runtime.block_on(
            futures::stream::iter(requests)
                .map(|request| self.run_child(request))
                .buffer_unordered(workers)
                .collect(),
        )
    }
}
