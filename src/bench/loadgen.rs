//! Concurrent HTTP load generator.
//!
//! - N workers released together by a barrier
//! - each worker sends its share of requests sequentially
//! - shared connection pool with keep-alive
//! - per-request timeout, failures are collected but never retried

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Barrier;
use tracing::{debug, warn};

use crate::constants::REQUEST_TIMEOUT;
use crate::error::{Error, Result, TransportError};

/// One completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    /// Index of the worker that issued the request.
    pub worker: usize,
    /// Send-to-last-byte latency.
    pub elapsed: Duration,
}

/// Everything a single run produced.
#[derive(Debug, Clone)]
pub struct LoadRun {
    pub concurrency: usize,
    /// Requests actually issued, `requests_per_worker * concurrency`.
    pub issued: usize,
    /// Completed requests, in no particular order.
    pub samples: Vec<TimingSample>,
    /// Requests that failed or timed out.
    pub failures: Vec<TransportError>,
    /// Time from releasing the workers until the last one finished.
    pub wall_clock: Duration,
}

/// Splits `total_requests` across `concurrency` workers.
///
/// Returns the number of requests each worker sends. Any remainder is
/// dropped rather than spread over a subset of workers.
pub fn requests_per_worker(concurrency: usize, total_requests: usize) -> Result<usize> {
    if concurrency == 0 {
        return Err(Error::invalid_input("concurrency must be at least 1"));
    }
    if total_requests == 0 {
        return Err(Error::invalid_input("total requests must be at least 1"));
    }
    if concurrency > total_requests {
        return Err(Error::invalid_input(format!(
            "concurrency {concurrency} exceeds total requests {total_requests}"
        )));
    }
    Ok(total_requests / concurrency)
}

/// HTTP load generator sharing one pooled client across its workers.
#[derive(Debug, Clone)]
pub struct LoadGenerator {
    client: Client,
    timeout: Duration,
}

impl LoadGenerator {
    /// Builds a generator with the default 30s request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Builds a generator with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Drives `concurrency` workers against `url` until each has sent its
    /// share of `total_requests`.
    ///
    /// Returns once every worker has finished. Failed requests are logged,
    /// left out of the samples and reported in [`LoadRun::failures`].
    pub async fn run(
        &self,
        url: &str,
        concurrency: usize,
        total_requests: usize,
    ) -> Result<LoadRun> {
        let per_worker = requests_per_worker(concurrency, total_requests)?;
        let url: Arc<str> = url.into();
        debug!(%url, concurrency, per_worker, "starting load run");

        let start_barrier = Arc::new(Barrier::new(concurrency + 1));
        let mut handles = Vec::with_capacity(concurrency);

        for worker in 0..concurrency {
            let client = self.client.clone();
            let url = Arc::clone(&url);
            let barrier = Arc::clone(&start_barrier);
            let timeout = self.timeout;

            handles.push(tokio::spawn(async move {
                barrier.wait().await;

                let mut samples = Vec::with_capacity(per_worker);
                let mut failures = Vec::new();
                for _ in 0..per_worker {
                    let start = Instant::now();
                    match send_request(&client, &url, timeout).await {
                        Ok(()) => samples.push(TimingSample {
                            worker,
                            elapsed: start.elapsed(),
                        }),
                        Err(err) => {
                            warn!(worker, %url, error = %err, "request failed");
                            failures.push(err);
                        },
                    }
                }
                (samples, failures)
            }));
        }

        // Wait for all workers to be ready
        start_barrier.wait().await;
        let run_start = Instant::now();

        let mut samples = Vec::with_capacity(per_worker * concurrency);
        let mut failures = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((worker_samples, worker_failures)) => {
                    samples.extend(worker_samples);
                    failures.extend(worker_failures);
                },
                Err(e) => {
                    warn!(error = %e, "load worker aborted");
                    failures.push(TransportError::Other(format!("worker aborted: {e}")));
                },
            }
        }
        let wall_clock = run_start.elapsed();

        debug!(
            completed = samples.len(),
            failed = failures.len(),
            wall_clock_ms = wall_clock.as_millis() as u64,
            "load run finished"
        );

        Ok(LoadRun {
            concurrency,
            issued: per_worker * concurrency,
            samples,
            failures,
            wall_clock,
        })
    }
}

async fn send_request(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> std::result::Result<(), TransportError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TransportError::from_reqwest(&e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    // Read the whole body so the timing covers the full response.
    response
        .bytes()
        .await
        .map_err(|e| TransportError::from_reqwest(&e, timeout))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_per_worker_even_split() {
        assert_eq!(requests_per_worker(1, 100).unwrap(), 100);
        assert_eq!(requests_per_worker(10, 100).unwrap(), 10);
        assert_eq!(requests_per_worker(100, 100).unwrap(), 1);
    }

    #[test]
    fn test_requests_per_worker_drops_remainder() {
        assert_eq!(requests_per_worker(3, 100).unwrap(), 33);
        assert_eq!(requests_per_worker(50, 120).unwrap(), 2);
    }

    #[test]
    fn test_requests_per_worker_rejects_bad_input() {
        assert!(matches!(
            requests_per_worker(0, 100),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            requests_per_worker(10, 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            requests_per_worker(101, 100),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_generator_timeout() {
        assert_eq!(LoadGenerator::new().unwrap().timeout(), REQUEST_TIMEOUT);

        let generator = LoadGenerator::with_timeout(Duration::from_millis(250)).unwrap();
        assert_eq!(generator.timeout(), Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_run_rejects_zero_concurrency_before_sending() {
        let generator = LoadGenerator::new().unwrap();
        let result = generator.run("http://127.0.0.1:9/process", 0, 10).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_reported_not_sampled() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let generator = LoadGenerator::with_timeout(Duration::from_secs(2)).unwrap();

        let run = generator
            .run(&format!("http://127.0.0.1:{port}/process"), 2, 4)
            .await
            .unwrap();

        assert!(run.samples.is_empty());
        assert_eq!(run.failures.len(), 4);
        assert_eq!(run.issued, 4);
    }
}
