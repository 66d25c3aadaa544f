//! Load generation and measurement.
//!
//! - [`loadgen`] - concurrent HTTP workers producing timing samples
//! - [`aggregate`] - mean latency, throughput and percentiles
//! - [`compare`] - all strategies across several concurrency levels

pub mod aggregate;
pub mod compare;
pub mod loadgen;

pub use aggregate::{BenchmarkResult, summarize, summarize_samples};
pub use compare::{ComparisonRow, StrategyResult, Target, compare};
pub use loadgen::{LoadGenerator, LoadRun, TimingSample, requests_per_worker};
