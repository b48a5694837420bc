use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;

use tracing::{debug, error};

use super::Scheduler;
use crate::client::create_blocking_client;
use crate::config::FetchConfig;
use crate::error::DownloadError;
use crate::fetch::fetch_blocking;
use crate::model::{DownloadRequest, ItemOutcome};

/// Runs the batch on a scoped pool of OS threads.
///
/// Workers pull the next request index from a shared counter, so a slow item
/// never holds up the rest of the queue. All workers share one blocking client
/// and its connection pool.
pub struct ThreadScheduler {
    config: FetchConfig,
    client: reqwest::blocking::Client,
}

impl ThreadScheduler {
    /// Must be called outside of any async runtime.
    pub fn new(config: FetchConfig) -> Result<Self, DownloadError> {
        let client = create_blocking_client(&config)?;
        Ok(Self { config, client })
    }

    fn run_queue(
        &self,
        requests: &[DownloadRequest],
        next: &AtomicUsize,
        tx: &mpsc::Sender<ItemOutcome>,
    ) {
        while let Some(request) = requests.get(next.fetch_add(1, Ordering::Relaxed)) {
            let result = fetch_blocking(&self.client, &request.url, &self.config);
            if tx
                .send(ItemOutcome::from_result(request, result))
                .is_err()
            {
                break;
            }
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, requests: &[DownloadRequest]) -> Vec<ItemOutcome> {
        let workers = self.config.worker_count(requests.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        debug!(workers, items = requests.len(), "Starting thread pool");

        std::thread::scope(|scope| {
            for worker_id in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let spawned = std::thread::Builder::new()
                    .name(format!("imgrab-worker-{worker_id}"))
                    .spawn_scoped(scope, move || self.run_queue(requests, next, &tx));

                if let Err(e) = spawned {
                    error!(worker_id, error = %e, "Failed to spawn worker thread");
                    break;
                }
            }
        });

        // Whatever no worker picked up (spawn failures) runs here.
        self.run_queue(requests, &next, &tx);
        drop(tx);

        rx.into_iter().collect()
    }
}
