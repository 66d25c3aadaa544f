//! Lock contention harness.
//!
//! Compares three ways of protecting a shared request counter and record
//! map under concurrent HTTP load:
//!
//! - **held-lock**: one mutex guard spans the entire request, workload included
//! - **minimal-lock**: the mutex is taken only to read and to write
//! - **lock-free**: an atomic counter and a sharded concurrent map
//!
//! [`handler`] implements the strategies over [`repository`], [`server`]
//! exposes each one over HTTP, and [`bench`] drives concurrent clients
//! against them and summarizes latency and throughput.

pub mod bench;
pub mod config;
pub mod constants;
pub mod error;
pub mod handler;
pub mod logging;
pub mod repository;
pub mod server;
pub mod ui;

pub use error::{Error, Result, TransportError};
