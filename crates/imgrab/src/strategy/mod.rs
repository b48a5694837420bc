//! Scheduling disciplines for running a batch of fetch-and-store operations.
//!
//! Every scheduler drives the same per-URL operation from [`crate::fetch`] and
//! yields exactly one [`ItemOutcome`] per request; only the execution model
//! differs:
//!
//! - [`ThreadScheduler`]: OS threads sharing one blocking client
//! - [`ProcessScheduler`]: one child process per request, outcomes reported
//!   back over the child's stdout
//! - [`CooperativeScheduler`]: futures interleaved on a single-threaded runtime

use crate::model::{DownloadRequest, ItemOutcome};

mod cooperative;
mod process;
mod threaded;

pub use cooperative::CooperativeScheduler;
pub use process::{ProcessScheduler, WorkerProgram};
pub use threaded::ThreadScheduler;

/// How a batch is scheduled. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ExecutionStrategy {
    /// Parallel OS threads sharing process memory
    #[default]
    Thread,
    /// Independent worker processes with no shared memory
    Process,
    /// Single-threaded cooperative async I/O
    Async,
}

impl ExecutionStrategy {
    pub const ALL: [ExecutionStrategy; 3] = [
        ExecutionStrategy::Thread,
        ExecutionStrategy::Process,
        ExecutionStrategy::Async,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Thread => "thread",
            ExecutionStrategy::Process => "process",
            ExecutionStrategy::Async => "async",
        }
    }
}

impl std::fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thread" => Ok(ExecutionStrategy::Thread),
            "process" => Ok(ExecutionStrategy::Process),
            "async" => Ok(ExecutionStrategy::Async),
            other => Err(format!(
                "unknown strategy `{other}` (expected thread, process or async)"
            )),
        }
    }
}

/// A scheduling discipline for a batch of requests.
///
/// Implementations block until every request has reached a terminal state and
/// return one outcome per request, in any order.
pub trait Scheduler {
    fn schedule(&self, requests: &[DownloadRequest]) -> Vec<ItemOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_cli_spellings() {
        assert_eq!("thread".parse(), Ok(ExecutionStrategy::Thread));
        assert_eq!("process".parse(), Ok(ExecutionStrategy::Process));
        assert_eq!("async".parse(), Ok(ExecutionStrategy::Async));
        assert!("fiber".parse::<ExecutionStrategy>().is_err());
    }

    #[test]
    fn default_strategy_is_thread() {
        assert_eq!(ExecutionStrategy::default(), ExecutionStrategy::Thread);
        assert_eq!(ExecutionStrategy::default().to_string(), "thread");
    }
}
