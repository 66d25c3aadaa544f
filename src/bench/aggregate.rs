//! Latency and throughput statistics for a load run.

use std::time::Duration;

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::loadgen::{LoadRun, TimingSample};

/// Highest latency the histogram tracks, in microseconds (60s).
const HISTOGRAM_MAX_US: u64 = 60_000_000;

/// Statistics for one concurrency level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub concurrency: usize,
    /// Requests that completed and were sampled.
    pub completed: usize,
    /// Requests that failed or timed out.
    pub failed: usize,
    /// Issued requests divided by the wall clock of the whole run.
    pub requests_per_sec: f64,
    /// Arithmetic mean of the sample latencies.
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p99_ms: f64,
    pub max_ms: f64,
}

impl BenchmarkResult {
    /// Result for a run that produced no samples.
    pub fn empty(concurrency: usize, failed: usize) -> Self {
        Self {
            concurrency,
            completed: 0,
            failed,
            requests_per_sec: 0.0,
            mean_ms: 0.0,
            p50_ms: 0.0,
            p99_ms: 0.0,
            max_ms: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.completed == 0
    }
}

/// Summarizes a finished load run.
pub fn summarize(run: &LoadRun) -> BenchmarkResult {
    summarize_samples(
        run.concurrency,
        &run.samples,
        run.failures.len(),
        run.issued,
        run.wall_clock,
    )
}

/// Summarizes raw samples.
///
/// Throughput is `issued / wall_clock`, not based on the sum of the sample
/// durations: under a held lock the samples add up to far more time than
/// actually elapsed. Failed requests still count towards `issued`.
/// An empty sample set (or a zero wall clock) yields zeros instead of
/// dividing by zero.
pub fn summarize_samples(
    concurrency: usize,
    samples: &[TimingSample],
    failed: usize,
    issued: usize,
    wall_clock: Duration,
) -> BenchmarkResult {
    if samples.is_empty() {
        return BenchmarkResult::empty(concurrency, failed);
    }

    let total: Duration = samples.iter().map(|s| s.elapsed).sum();
    let mean_ms = total.as_secs_f64() * 1000.0 / samples.len() as f64;

    let requests_per_sec = if wall_clock.is_zero() {
        0.0
    } else {
        issued as f64 / wall_clock.as_secs_f64()
    };

    let (p50_ms, p99_ms) = match latency_histogram(samples) {
        Some(hist) => (
            hist.value_at_percentile(50.0) as f64 / 1000.0,
            hist.value_at_percentile(99.0) as f64 / 1000.0,
        ),
        None => (0.0, 0.0),
    };
    let max_ms = samples
        .iter()
        .map(|s| s.elapsed)
        .max()
        .unwrap_or_default()
        .as_secs_f64()
        * 1000.0;

    BenchmarkResult {
        concurrency,
        completed: samples.len(),
        failed,
        requests_per_sec,
        mean_ms,
        p50_ms,
        p99_ms,
        max_ms,
    }
}

fn latency_histogram(samples: &[TimingSample]) -> Option<Histogram<u64>> {
    let mut hist = match Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_US, 3) {
        Ok(hist) => hist,
        Err(e) => {
            warn!(error = %e, "failed to create latency histogram");
            return None;
        },
    };
    for sample in samples {
        let micros = u64::try_from(sample.elapsed.as_micros()).unwrap_or(u64::MAX);
        // Saturate instead of failing on out-of-range latencies.
        hist.saturating_record(micros.max(1));
    }
    Some(hist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    fn sample(ms: u64) -> TimingSample {
        TimingSample {
            worker: 0,
            elapsed: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_empty_samples_yield_zeros() {
        let result = summarize_samples(10, &[], 3, 3, Duration::from_secs(1));
        assert!(result.is_empty());
        assert_eq!(result.failed, 3);
        assert_eq!(result.mean_ms, 0.0);
        assert_eq!(result.requests_per_sec, 0.0);
        assert_eq!(result.p99_ms, 0.0);
    }

    #[test]
    fn test_zero_wall_clock_does_not_divide_by_zero() {
        let result = summarize_samples(1, &[sample(5)], 0, 1, Duration::ZERO);
        assert_eq!(result.requests_per_sec, 0.0);
        assert!((result.mean_ms - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_latency() {
        let samples = [sample(10), sample(20), sample(30), sample(40)];
        let result = summarize_samples(2, &samples, 0, 4, Duration::from_millis(100));
        assert!((result.mean_ms - 25.0).abs() < 1e-9);
        assert!((result.max_ms - 40.0).abs() < 1e-9);
        assert_eq!(result.completed, 4);
    }

    #[test]
    fn test_throughput_uses_wall_clock_not_sample_sum() {
        // Ten 100ms requests that overlapped completely within 100ms.
        let samples = vec![sample(100); 10];
        let result = summarize_samples(10, &samples, 0, 10, Duration::from_millis(100));
        assert!((result.requests_per_sec - 100.0).abs() < 1e-6);

        // The same samples serialized back to back over one second.
        let result = summarize_samples(1, &samples, 0, 10, Duration::from_secs(1));
        assert!((result.requests_per_sec - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_percentiles() {
        let samples: Vec<_> = (1..=100).map(sample).collect();
        let result = summarize_samples(1, &samples, 0, 100, Duration::from_secs(5));
        assert!((result.p50_ms - 50.0).abs() < 0.2, "p50 = {}", result.p50_ms);
        assert!((result.p99_ms - 99.0).abs() < 0.2, "p99 = {}", result.p99_ms);
    }

    #[test]
    fn test_summarize_run() {
        let run = LoadRun {
            concurrency: 2,
            issued: 4,
            samples: vec![sample(10), sample(30)],
            failures: vec![TransportError::Status(500)],
            wall_clock: Duration::from_millis(40),
        };
        let result = summarize(&run);
        assert_eq!(result.concurrency, 2);
        assert_eq!(result.completed, 2);
        assert_eq!(result.failed, 1);
        assert!((result.mean_ms - 20.0).abs() < 1e-9);
        assert!((result.requests_per_sec - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_throughput_counts_failed_requests() {
        // Half of the issued requests timed out.
        let run = LoadRun {
            concurrency: 4,
            issued: 8,
            samples: vec![sample(5); 4],
            failures: vec![TransportError::Timeout { timeout_ms: 100 }; 4],
            wall_clock: Duration::from_millis(200),
        };
        let result = summarize(&run);
        assert_eq!(result.completed, 4);
        assert_eq!(result.failed, 4);
        assert!((result.requests_per_sec - 40.0).abs() < 1e-6);
    }
}
