//! Side-by-side comparison of the strategies across concurrency levels.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregate::{BenchmarkResult, summarize};
use super::loadgen::LoadGenerator;
use crate::error::{Error, Result};
use crate::handler::Strategy;

/// A strategy and the `/process` URL serving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub strategy: Strategy,
    pub url: String,
}

impl Target {
    pub fn new(strategy: Strategy, url: impl Into<String>) -> Self {
        Self {
            strategy,
            url: url.into(),
        }
    }
}

/// Result of one strategy at one concurrency level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy: Strategy,
    #[serde(flatten)]
    pub result: BenchmarkResult,
}

/// All strategies measured at one concurrency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub concurrency: usize,
    pub results: Vec<StrategyResult>,
}

impl ComparisonRow {
    /// Result for `strategy`, if it was measured.
    pub fn result(&self, strategy: Strategy) -> Option<&BenchmarkResult> {
        self.results
            .iter()
            .find(|r| r.strategy == strategy)
            .map(|r| &r.result)
    }

    /// Largest mean-latency reduction relative to the held-lock baseline,
    /// in percent, together with the strategy that achieved it.
    ///
    /// `None` when the baseline is missing or produced no samples.
    pub fn best_improvement(&self) -> Option<(Strategy, f64)> {
        let baseline = self.result(Strategy::HeldLock)?;
        if baseline.is_empty() || baseline.mean_ms <= 0.0 {
            return None;
        }

        self.results
            .iter()
            .filter(|r| r.strategy != Strategy::HeldLock && !r.result.is_empty())
            .map(|r| {
                let gain = (baseline.mean_ms - r.result.mean_ms) / baseline.mean_ms * 100.0;
                (r.strategy, gain)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Runs `requests` requests against every target at every level.
///
/// Targets are measured one after another so they never compete for CPU.
pub async fn compare(
    generator: &LoadGenerator,
    targets: &[Target],
    levels: &[usize],
    requests: usize,
) -> Result<Vec<ComparisonRow>> {
    if targets.is_empty() {
        return Err(Error::invalid_input("no targets to compare"));
    }
    if levels.is_empty() {
        return Err(Error::invalid_input("no concurrency levels given"));
    }

    let mut rows = Vec::with_capacity(levels.len());
    for &concurrency in levels {
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let run = generator.run(&target.url, concurrency, requests).await?;
            let result = summarize(&run);
            info!(
                strategy = %target.strategy,
                concurrency,
                completed = result.completed,
                failed = result.failed,
                mean_ms = result.mean_ms,
                requests_per_sec = result.requests_per_sec,
                "level measured"
            );
            results.push(StrategyResult {
                strategy: target.strategy,
                result,
            });
        }
        rows.push(ComparisonRow {
            concurrency,
            results,
        });
    }
    Ok(rows)
}
