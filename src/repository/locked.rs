//! Mutex-backed repository.
//!
//! The whole [`RepositoryState`] lives behind one `parking_lot::Mutex`.
//! Callers either use the [`Repository`] methods, which each take the lock
//! once, or hold a [`LockedState`] guard across several operations. Every
//! guard records how long it was held so tests can check where a handler's
//! critical sections begin and end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};

use super::Repository;
use super::record::{RepositoryState, RepositoryStats, SharedRecord, Snapshot};

/// Repository guarded by a single exclusive lock.
#[derive(Debug, Default)]
pub struct LockedRepository {
    state: Mutex<RepositoryState>,
    metrics: LockMetrics,
}

impl LockedRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock and returns a guard over the state.
    ///
    /// The lock is released when the guard is dropped. Keep the guard's
    /// scope to the block that actually needs exclusive access.
    pub fn lock(&self) -> LockedState<'_> {
        let guard = self.state.lock();
        LockedState {
            guard,
            acquired_at: Instant::now(),
            metrics: &self.metrics,
        }
    }

    /// Lock hold statistics accumulated since creation or the last reset.
    pub fn lock_metrics(&self) -> LockMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Clears the accumulated lock hold statistics.
    pub fn reset_lock_metrics(&self) {
        self.metrics.reset();
    }
}

impl Repository for LockedRepository {
    fn record_request(&self) -> u64 {
        self.lock().next_id()
    }

    fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    fn store(&self, key: &str, record: SharedRecord) {
        self.lock().store(key, record);
    }

    fn get(&self, key: &str) -> Option<SharedRecord> {
        self.lock().get(key)
    }

    fn stats(&self) -> RepositoryStats {
        self.lock().stats()
    }
}

/// Exclusive access to the repository state.
///
/// Produced by [`LockedRepository::lock`]. Dropping it releases the lock and
/// records the hold duration.
pub struct LockedState<'a> {
    guard: MutexGuard<'a, RepositoryState>,
    acquired_at: Instant,
    metrics: &'a LockMetrics,
}

impl LockedState<'_> {
    /// Increments the request counter and returns the new value.
    pub fn next_id(&mut self) -> u64 {
        self.guard.counter += 1;
        self.guard.counter
    }

    /// Deep copy of all records.
    pub fn snapshot(&self) -> Snapshot {
        self.guard.data.clone()
    }

    /// Inserts or replaces one record.
    pub fn store(&mut self, key: &str, record: SharedRecord) {
        self.guard.data.insert(key.to_string(), record);
    }

    /// Copy of one record.
    pub fn get(&self, key: &str) -> Option<SharedRecord> {
        self.guard.data.get(key).cloned()
    }

    /// Counter and record count.
    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            total_requests: self.guard.counter,
            data_size: self.guard.data.len(),
        }
    }
}

impl Drop for LockedState<'_> {
    fn drop(&mut self) {
        // Runs before `guard` is dropped, so the lock is still held here.
        self.metrics.record(self.acquired_at.elapsed());
    }
}

/// Lock hold counters, updated on every guard drop.
#[derive(Debug, Default)]
struct LockMetrics {
    acquisitions: AtomicU64,
    total_hold_ns: AtomicU64,
    max_hold_ns: AtomicU64,
}

impl LockMetrics {
    fn record(&self, held: Duration) {
        let nanos = u64::try_from(held.as_nanos()).unwrap_or(u64::MAX);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        self.total_hold_ns.fetch_add(nanos, Ordering::Relaxed);
        self.max_hold_ns.fetch_max(nanos, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LockMetricsSnapshot {
        LockMetricsSnapshot {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            total_hold: Duration::from_nanos(self.total_hold_ns.load(Ordering::Relaxed)),
            max_hold: Duration::from_nanos(self.max_hold_ns.load(Ordering::Relaxed)),
        }
    }

    fn reset(&self) {
        self.acquisitions.store(0, Ordering::Relaxed);
        self.total_hold_ns.store(0, Ordering::Relaxed);
        self.max_hold_ns.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of the lock hold counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockMetricsSnapshot {
    /// Number of guards dropped.
    pub acquisitions: u64,
    /// Sum of all hold durations.
    pub total_hold: Duration,
    /// Longest single hold.
    pub max_hold: Duration,
}

impl LockMetricsSnapshot {
    /// Average hold duration, zero when the lock was never taken.
    pub fn mean_hold(&self) -> Duration {
        if self.acquisitions == 0 {
            return Duration::ZERO;
        }
        self.total_hold / u32::try_from(self.acquisitions).unwrap_or(u32::MAX)
    }
}
