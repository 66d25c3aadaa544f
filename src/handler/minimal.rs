//! Handler that only locks around the state accesses.

use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use super::{ProcessResponse, RequestHandler, Strategy, Workload};
use crate::repository::{LockedRepository, Repository, RepositoryStats, SharedRecord, record_key};

/// Minimal-lock strategy.
///
/// Two critical sections per request: id allocation plus snapshot, then the
/// final write. The workload runs between them with no lock held.
pub struct MinimalLockHandler {
    repo: Arc<LockedRepository>,
    workload: Workload,
}

impl MinimalLockHandler {
    pub fn new(repo: Arc<LockedRepository>, workload: Workload) -> Self {
        Self { repo, workload }
    }

    pub fn repository(&self) -> &Arc<LockedRepository> {
        &self.repo
    }
}

impl RequestHandler for MinimalLockHandler {
    fn strategy(&self) -> Strategy {
        Strategy::MinimalLock
    }

    fn handle(&self) -> ProcessResponse {
        let start = Instant::now();

        let (id, snapshot) = {
            let mut state = self.repo.lock();
            let id = state.next_id();
            (id, state.snapshot())
        };

        let result = self.workload.run();

        let key = record_key(id);
        let record = SharedRecord::for_request(id, result);
        {
            let mut state = self.repo.lock();
            state.store(&key, record);
        }
        trace!(id, records_seen = snapshot.len(), "minimal-lock request done");

        ProcessResponse::new(Strategy::MinimalLock, id, result, start.elapsed())
    }

    fn stats(&self) -> RepositoryStats {
        self.repo.stats()
    }
}
