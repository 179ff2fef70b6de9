//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use vissim_com::sim::{SimObject, SimServer};
use vissim_com::{Session, SessionConfig};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness; honours `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Server whose network holds links numbered 1 through `count`
pub fn server_with_links(count: i32) -> SimServer {
    init_tracing();
    SimServer::new().with_links(1..=count)
}

/// Session on `server` with its native utilities attached
pub fn session_on(server: &SimServer, config: SessionConfig) -> Session<SimObject> {
    Session::with_server(server.vissim(), config).with_native_module(server.utilities())
}

/// Asserts no identity reference is left on the server
pub fn assert_balanced(server: &SimServer) {
    let (acquired, released) = server.identity_traffic();
    assert_eq!(acquired, released, "identity acquisitions and releases differ");
    assert_eq!(server.outstanding_refs(), 0, "identity references still held");
}

/// Outcome of one test category run by the harness
#[derive(Debug, Clone)]
pub struct CategoryResult {
    pub name: &'static str,
    pub passed: bool,
    pub duration: Duration,
    pub summary: String,
}

/// Results of a full harness run
#[derive(Debug, Default)]
pub struct TestSuiteResults {
    pub categories: Vec<CategoryResult>,
}

impl TestSuiteResults {
    pub fn record(&mut self, result: CategoryResult) {
        self.categories.push(result);
    }

    pub fn passed(&self) -> usize {
        self.categories.iter().filter(|c| c.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.categories.len() - self.passed()
    }

    pub fn total_duration(&self) -> Duration {
        self.categories.iter().map(|c| c.duration).sum()
    }
}
