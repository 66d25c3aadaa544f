//! Synthetic per-request workload.

use std::hint::black_box;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{WORKLOAD_ITERATIONS, WORKLOAD_SLEEP};

/// Fixed sleep followed by a CPU accumulation loop.
///
/// Every strategy runs the same workload so measured differences come from
/// locking alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    /// Blocking sleep modelling I/O-bound work.
    pub sleep: Duration,
    /// Iterations of the accumulation loop modelling CPU-bound work.
    pub iterations: u64,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            sleep: WORKLOAD_SLEEP,
            iterations: WORKLOAD_ITERATIONS,
        }
    }
}

impl Workload {
    pub fn new(sleep: Duration, iterations: u64) -> Self {
        Self { sleep, iterations }
    }

    /// Sleeps, then sums `0..iterations`. Blocks the calling thread.
    pub fn run(&self) -> u64 {
        std::thread::sleep(self.sleep);

        let mut result: u64 = 0;
        for i in 0..black_box(self.iterations) {
            result = result.wrapping_add(black_box(i));
        }
        result
    }

    /// Value `run` returns, without doing the work.
    pub fn expected_result(&self) -> u64 {
        let n = self.iterations;
        if n == 0 {
            return 0;
        }
        // Sum of 0..n, one factor halved first so the product stays in range.
        if n % 2 == 0 {
            (n / 2).wrapping_mul(n - 1)
        } else {
            n.wrapping_mul((n - 1) / 2)
        }
    }
}
