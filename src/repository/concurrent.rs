//! Lock-free repository backend.
//!
//! The request counter is a single `AtomicU64` and the records live in a
//! `DashMap`, which shards its entries so writers to keys in different
//! shards never wait on each other. Readers that iterate (snapshot, count)
//! walk the shards one at a time while writers keep going, so they observe
//! some consistent subset of the writes in flight. Records are always
//! replaced whole, never patched, so a reader can't see half of one.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::Repository;
use super::record::{RepositoryStats, SharedRecord, Snapshot};

/// Repository using an atomic counter and a concurrent map.
///
/// # Example
///
/// ```ignore
/// use lockbench::repository::{ConcurrentRepository, Repository};
///
/// let repo = ConcurrentRepository::new();
/// assert_eq!(repo.record_request(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ConcurrentRepository {
    counter: AtomicU64,
    data: DashMap<String, SharedRecord>,
}

impl ConcurrentRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no record has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Repository for ConcurrentRepository {
    fn record_request(&self) -> u64 {
        // The read-modify-write is atomic, so every caller sees a distinct value.
        self.counter.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn snapshot(&self) -> Snapshot {
        self.data
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn store(&self, key: &str, record: SharedRecord) {
        self.data.insert(key.to_string(), record);
    }

    fn get(&self, key: &str) -> Option<SharedRecord> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            total_requests: self.counter.load(Ordering::Acquire),
            data_size: self.data.len(),
        }
    }
}
