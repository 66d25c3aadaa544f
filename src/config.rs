//! Configuration for the servers and the benchmark driver.
//!
//! Everything has a default, so the file is optional. A `lockbench.toml`
//! may override any subset:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! held_lock_port = 8081
//!
//! [workload]
//! sleep_ms = 10
//! iterations = 1000000
//!
//! [bench]
//! timeout_secs = 30
//! requests = 100
//! levels = [1, 10, 50, 100]
//! ```
//!
//! Command-line flags take precedence over the file.

use std::collections::HashSet;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants;
use crate::handler::{Strategy, Workload};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub workload: WorkloadConfig,
    pub bench: BenchConfig,
}

/// Bind address and one port per strategy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub held_lock_port: u16,
    pub minimal_lock_port: u16,
    pub lock_free_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            held_lock_port: constants::HELD_LOCK_PORT,
            minimal_lock_port: constants::MINIMAL_LOCK_PORT,
            lock_free_port: constants::LOCK_FREE_PORT,
        }
    }
}

impl ServerConfig {
    /// Port assigned to `strategy`.
    pub fn port(&self, strategy: Strategy) -> u16 {
        match strategy {
            Strategy::HeldLock => self.held_lock_port,
            Strategy::MinimalLock => self.minimal_lock_port,
            Strategy::LockFree => self.lock_free_port,
        }
    }

    /// Socket address for `strategy`.
    pub fn addr(&self, strategy: Strategy) -> SocketAddr {
        SocketAddr::new(self.host, self.port(strategy))
    }

    /// `/process` URL for `strategy`.
    pub fn process_url(&self, strategy: Strategy) -> String {
        format!("http://{}/process", self.addr(strategy))
    }
}

fn default_host() -> IpAddr {
    constants::DEFAULT_HOST
        .parse()
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

/// Synthetic workload constants.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadConfig {
    pub sleep_ms: u64,
    pub iterations: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            sleep_ms: constants::WORKLOAD_SLEEP.as_millis() as u64,
            iterations: constants::WORKLOAD_ITERATIONS,
        }
    }
}

impl WorkloadConfig {
    pub fn workload(&self) -> Workload {
        Workload::new(Duration::from_millis(self.sleep_ms), self.iterations)
    }
}

/// Load generator settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub timeout_secs: u64,
    pub requests: usize,
    pub levels: Vec<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: constants::REQUEST_TIMEOUT.as_secs(),
            requests: constants::DEFAULT_REQUESTS,
            levels: constants::DEFAULT_LEVELS.to_vec(),
        }
    }
}

impl BenchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Loads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Invalid config file: {}", path.display()))?
            },
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML content without validating it.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Rejects settings that would make the benchmark meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.workload.iterations == 0 {
            anyhow::bail!("workload.iterations must be greater than 0");
        }
        if self.bench.timeout_secs == 0 {
            anyhow::bail!("bench.timeout_secs must be greater than 0");
        }
        if self.bench.requests == 0 {
            anyhow::bail!("bench.requests must be greater than 0");
        }
        if self.bench.levels.is_empty() {
            anyhow::bail!("bench.levels must list at least one concurrency level");
        }
        if let Some(&level) = self
            .bench
            .levels
            .iter()
            .find(|&&l| l == 0 || l > self.bench.requests)
        {
            anyhow::bail!(
                "bench.levels entry {level} must be between 1 and bench.requests ({})",
                self.bench.requests
            );
        }

        let ports: HashSet<u16> = Strategy::ALL
            .iter()
            .map(|&s| self.server.port(s))
            .collect();
        if ports.len() != Strategy::ALL.len() {
            anyhow::bail!("each strategy needs its own port");
        }
        Ok(())
    }
}
