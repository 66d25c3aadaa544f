//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use lockbench::handler::{Strategy, Workload, build};
use lockbench::server::ServerHandle;

/// Workload used by the end-to-end timing tests.
///
/// The sleep dominates; the CPU loop is short enough that parallel requests
/// don't saturate small CI machines.
pub fn timing_workload() -> Workload {
    Workload::new(Duration::from_millis(10), 10_000)
}

/// A strategy server on an ephemeral localhost port.
pub struct TestServer {
    pub strategy: Strategy,
    handle: ServerHandle,
}

impl TestServer {
    pub async fn start(strategy: Strategy, workload: Workload) -> Self {
        let addr = "127.0.0.1:0".parse().unwrap();
        let handle = ServerHandle::spawn(addr, build(strategy, workload))
            .await
            .expect("Failed to start test server");
        Self { strategy, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.handle.url())
    }

    pub fn process_url(&self) -> String {
        self.handle.process_url()
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        reqwest::Client::new().get(self.url(path)).send().await
    }

    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        self.get(path)
            .await
            .expect("request failed")
            .json()
            .await
            .expect("response is not JSON")
    }

    pub async fn stop(self) {
        self.handle.shutdown().await.expect("server shutdown failed");
    }
}
