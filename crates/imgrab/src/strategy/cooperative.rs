use futures::StreamExt;
use tracing::debug;

use super::Scheduler;
use crate::client::create_client;
use crate::config::FetchConfig;
use crate::error::DownloadError;
use crate::fetch::fetch_async;
use crate::model::{DownloadRequest, ItemOutcome};

/// Runs the batch as futures on a single-threaded runtime.
///
/// Items interleave only where they wait on the network: the request, and each
/// chunk of the response body. With `max_workers = Some(1)` items run strictly
/// in submission order.
pub struct CooperativeScheduler {
    config: FetchConfig,
}

impl CooperativeScheduler {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    async fn run_all(&self, requests: &[DownloadRequest]) -> Vec<ItemOutcome> {
        let client = match create_client(&self.config) {
            Ok(client) => client,
            Err(e) => return fail_all(requests, &e),
        };
        let workers = self.config.worker_count(requests.len());
        debug!(workers, items = requests.len(), "Starting cooperative fetches");

        futures::stream::iter(requests)
            .map(|request| {
                let client = &client;
                async move {
                    let result = fetch_async(client, &request.url, &self.config).await;
                    ItemOutcome::from_result(request, result)
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await
    }
}

fn fail_all(requests: &[DownloadRequest], error: &DownloadError) -> Vec<ItemOutcome> {
    requests
        .iter()
        .map(|request| ItemOutcome::failed(request, error))
        .collect()
}

impl Scheduler for CooperativeScheduler {
    fn schedule(&self, requests: &[DownloadRequest]) -> Vec<ItemOutcome> {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => return fail_all(requests, &DownloadError::runtime(e.to_string())),
        };

        runtime.block_on(self.run_all(requests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubServer;
    use std::time::Instant;

    #[test]
    fn slow_items_overlap_on_one_thread() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let scheduler =
            CooperativeScheduler::new(FetchConfig::builder().output_dir(dir.path()).build());

        let urls: Vec<String> = (0..4)
            .map(|i| server.url(&format!("/slow/{i}.png")))
            .collect();
        let requests = DownloadRequest::from_urls(&urls);

        let start = Instant::now();
        let outcomes = scheduler.schedule(&requests);
        let elapsed = start.elapsed();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(ItemOutcome::is_success));
        // Four sequential waits would take at least 4 * SLOW_DELAY.
        assert!(
            elapsed < StubServer::SLOW_DELAY * 4,
            "cooperative fetches did not overlap: {elapsed:?}"
        );
    }

    #[test]
    fn single_worker_keeps_submission_order() {
        let server = StubServer::start();
        let dir = tempfile::tempdir().unwrap();
        let scheduler = CooperativeScheduler::new(
            FetchConfig::builder()
                .output_dir(dir.path())
                .max_workers(Some(1))
                .build(),
        );

        let requests = DownloadRequest::from_urls(&[
            server.url("/slow/first.png"),
            server.url("/images/second.png"),
        ]);
        let outcomes = scheduler.schedule(&requests);

        let order: Vec<usize> = outcomes.iter().map(|o| o.index).collect();
        assert_eq!(order, vec![0, 1]);
    }
}
