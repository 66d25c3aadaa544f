//! Default values shared by the CLI, the config file and the harness.

use std::time::Duration;

/// Default bind host for the strategy servers.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port of the held-lock server.
pub const HELD_LOCK_PORT: u16 = 8081;

/// Default port of the minimal-lock server.
pub const MINIMAL_LOCK_PORT: u16 = 8082;

/// Default port of the lock-free server.
pub const LOCK_FREE_PORT: u16 = 8083;

/// Sleep performed by every request to model I/O-bound work.
pub const WORKLOAD_SLEEP: Duration = Duration::from_millis(10);

/// Iterations of the CPU accumulation loop performed by every request.
pub const WORKLOAD_ITERATIONS: u64 = 1_000_000;

/// Per-request client timeout used by the load generator.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Requests issued per concurrency level by `compare`.
pub const DEFAULT_REQUESTS: usize = 100;

/// Concurrency levels exercised by `compare`.
pub const DEFAULT_LEVELS: [usize; 4] = [1, 10, 50, 100];

/// Key prefix for records written by the handlers.
pub const RECORD_KEY_PREFIX: &str = "request_";
