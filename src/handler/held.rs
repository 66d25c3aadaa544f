//! Handler that keeps the repository locked for the whole request.

use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use super::{ProcessResponse, RequestHandler, Strategy, Workload};
use crate::repository::{LockedRepository, Repository, RepositoryStats, SharedRecord, record_key};

/// Held-lock baseline.
///
/// The guard is taken on entry and only dropped when `handle` returns, so
/// the workload (sleep included) runs with the lock held. At most one
/// request makes progress at a time no matter how many threads call in.
pub struct HeldLockHandler {
    repo: Arc<LockedRepository>,
    workload: Workload,
}

impl HeldLockHandler {
    pub fn new(repo: Arc<LockedRepository>, workload: Workload) -> Self {
        Self { repo, workload }
    }

    pub fn repository(&self) -> &Arc<LockedRepository> {
        &self.repo
    }
}

impl RequestHandler for HeldLockHandler {
    fn strategy(&self) -> Strategy {
        Strategy::HeldLock
    }

    fn handle(&self) -> ProcessResponse {
        let start = Instant::now();
        let mut state = self.repo.lock();

        let id = state.next_id();
        let snapshot = state.snapshot();

        let result = self.workload.run();

        state.store(&record_key(id), SharedRecord::for_request(id, result));
        trace!(id, records_seen = snapshot.len(), "held-lock request done");

        ProcessResponse::new(Strategy::HeldLock, id, result, start.elapsed())
    }

    fn stats(&self) -> RepositoryStats {
        self.repo.stats()
    }
}
