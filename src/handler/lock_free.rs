//! Handler over the lock-free repository.

use std::sync::Arc;
use std::time::Instant;

use tracing::trace;

use super::{ProcessResponse, RequestHandler, Strategy, Workload};
use crate::repository::{
    ConcurrentRepository, Repository, RepositoryStats, SharedRecord, record_key,
};

/// Lock-free strategy: atomic id allocation and a concurrent map.
pub struct LockFreeHandler {
    repo: Arc<ConcurrentRepository>,
    workload: Workload,
}

impl LockFreeHandler {
    pub fn new(repo: Arc<ConcurrentRepository>, workload: Workload) -> Self {
        Self { repo, workload }
    }

    pub fn repository(&self) -> &Arc<ConcurrentRepository> {
        &self.repo
    }
}

impl RequestHandler for LockFreeHandler {
    fn strategy(&self) -> Strategy {
        Strategy::LockFree
    }

    fn handle(&self) -> ProcessResponse {
        let start = Instant::now();

        let id = self.repo.record_request();
        let snapshot = self.repo.snapshot();

        let result = self.workload.run();

        self.repo
            .store(&record_key(id), SharedRecord::for_request(id, result));
        trace!(id, records_seen = snapshot.len(), "lock-free request done");

        ProcessResponse::new(Strategy::LockFree, id, result, start.elapsed())
    }

    fn stats(&self) -> RepositoryStats {
        self.repo.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_handle_stores_result_under_request_key() {
        let workload = Workload::new(Duration::from_millis(1), 1_000);
        let handler = LockFreeHandler::new(Arc::new(ConcurrentRepository::new()), workload);

        let response = handler.handle();

        let record = handler
            .repository()
            .get(&record_key(response.counter))
            .expect("record stored");
        assert_eq!(record.counter, workload.expected_result());
        assert_eq!(handler.repository().len(), 1);
        assert_eq!(handler.stats().total_requests, 1);
    }
}
