//! Record and state types stored by the repositories.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::RECORD_KEY_PREFIX;

/// One entry of the shared map.
///
/// Records are plain owned values: cloning one yields a deep copy that
/// shares nothing with the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedRecord {
    pub identifier: String,
    pub name: String,
    pub is_active: bool,
    pub counter: u64,
    pub last_modified: DateTime<Utc>,
}

impl SharedRecord {
    /// Build the record a handler writes for request `id`.
    pub fn for_request(id: u64, result: u64) -> Self {
        Self {
            identifier: record_key(id),
            name: format!("Request {id}"),
            is_active: true,
            counter: result,
            last_modified: Utc::now(),
        }
    }
}

/// Key under which the record for request `id` is stored.
pub fn record_key(id: u64) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}

/// Isolated copy of all records at one point in time.
pub type Snapshot = HashMap<String, SharedRecord>;

/// Counter and map guarded by the mutex-based repository.
#[derive(Debug, Default)]
pub struct RepositoryState {
    pub(crate) counter: u64,
    pub(crate) data: HashMap<String, SharedRecord>,
}

/// Values reported by `GET /stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub total_requests: u64,
    pub data_size: usize,
}
