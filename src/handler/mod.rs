//! Request handlers, one per synchronization strategy.
//!
//! Every handler performs the same steps: allocate an id, copy the current
//! records, run the [`Workload`], write one record. They differ only in
//! when the repository lock is held relative to the workload:
//!
//! - [`HeldLockHandler`]: one guard spans the whole body.
//! - [`MinimalLockHandler`]: two short guards, none across the workload.
//! - [`LockFreeHandler`]: atomic id plus concurrent map, no guard at all.

mod held;
mod lock_free;
mod minimal;
mod workload;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::repository::{ConcurrentRepository, LockedRepository, RepositoryStats};

pub use held::HeldLockHandler;
pub use lock_free::LockFreeHandler;
pub use minimal::MinimalLockHandler;
pub use workload::Workload;

/// How a handler synchronizes access to its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    HeldLock,
    MinimalLock,
    LockFree,
}

impl Strategy {
    /// All strategies, slowest first.
    pub const ALL: [Strategy; 3] = [Self::HeldLock, Self::MinimalLock, Self::LockFree];

    /// Value of the `method` field in `/process` responses.
    pub fn method(self) -> &'static str {
        match self {
            Self::HeldLock => "held_lock",
            Self::MinimalLock => "minimal_lock",
            Self::LockFree => "lock_free",
        }
    }

    /// Stable kebab-case name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeldLock => "held-lock",
            Self::MinimalLock => "minimal-lock",
            Self::LockFree => "lock-free",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "held-lock" | "held_lock" | "held" => Ok(Self::HeldLock),
            "minimal-lock" | "minimal_lock" | "minimal" => Ok(Self::MinimalLock),
            "lock-free" | "lock_free" | "lockfree" => Ok(Self::LockFree),
            other => Err(format!(
                "unknown strategy '{other}' (expected held-lock, minimal-lock or lock-free)"
            )),
        }
    }
}

/// Body of a `/process` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub method: String,
    /// Request id allocated by the repository.
    pub counter: u64,
    /// Output of the CPU loop.
    pub result: u64,
    /// Time spent inside the handler, in microseconds.
    pub duration: u64,
}

impl ProcessResponse {
    pub(crate) fn new(strategy: Strategy, id: u64, result: u64, elapsed: Duration) -> Self {
        Self {
            method: strategy.method().to_string(),
            counter: id,
            result,
            duration: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        }
    }
}

/// A request handler bound to one repository and one strategy.
///
/// `handle` blocks the calling thread for the duration of the workload (and,
/// depending on the strategy, for the time spent waiting on the lock), so
/// async callers must run it on a blocking thread.
pub trait RequestHandler: Send + Sync + 'static {
    /// Strategy this handler implements.
    fn strategy(&self) -> Strategy;

    /// Processes one request.
    fn handle(&self) -> ProcessResponse;

    /// Read-only view of the repository counters.
    fn stats(&self) -> RepositoryStats;
}

/// Builds a handler for `strategy` over a fresh repository.
pub fn build(strategy: Strategy, workload: Workload) -> Arc<dyn RequestHandler> {
    match strategy {
        Strategy::HeldLock => Arc::new(HeldLockHandler::new(
            Arc::new(LockedRepository::new()),
            workload,
        )),
        Strategy::MinimalLock => Arc::new(MinimalLockHandler::new(
            Arc::new(LockedRepository::new()),
            workload,
        )),
        Strategy::LockFree => Arc::new(LockFreeHandler::new(
            Arc::new(ConcurrentRepository::new()),
            workload,
        )),
    }
}
