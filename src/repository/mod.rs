//! Shared request counter and record map with pluggable synchronization.
//!
//! Two storage implementations sit behind the [`Repository`] trait:
//!
//! - **LockedRepository**: counter and map behind a single mutex. Exposes a
//!   scoped [`LockedState`] guard so a handler can decide how much of its
//!   body runs under the lock.
//! - **ConcurrentRepository**: atomic counter plus a sharded `DashMap`; no
//!   explicit locking at all.
//!
//! # Example
//!
//! ```ignore
//! use lockbench::repository::{LockedRepository, Repository, SharedRecord, record_key};
//!
//! let repo = LockedRepository::new();
//! let id = repo.record_request();
//! repo.store(&record_key(id), SharedRecord::for_request(id, 0));
//! assert_eq!(repo.stats().data_size, 1);
//! ```

mod concurrent;
mod locked;
mod record;

#[cfg(test)]
mod tests;

pub use concurrent::ConcurrentRepository;
pub use locked::{LockMetricsSnapshot, LockedRepository, LockedState};
pub use record::{RepositoryState, RepositoryStats, SharedRecord, Snapshot, record_key};

/// Access to the shared counter and record map.
///
/// All implementations must be thread-safe (`Send + Sync`); they are shared
/// by every handler invocation through an `Arc`.
pub trait Repository: Send + Sync + 'static {
    /// Allocates the next request id.
    ///
    /// Ids start at 1 and are unique and strictly increasing across all
    /// concurrent callers.
    fn record_request(&self) -> u64;

    /// Returns a copy of every record currently stored.
    ///
    /// The returned map owns its records; writes made after this call
    /// returns never show up in it.
    fn snapshot(&self) -> Snapshot;

    /// Inserts or replaces the record stored under `key`.
    fn store(&self, key: &str, record: SharedRecord);

    /// Returns a copy of the record stored under `key`, if any.
    fn get(&self, key: &str) -> Option<SharedRecord>;

    /// Returns the request counter and the number of stored records.
    fn stats(&self) -> RepositoryStats;
}
