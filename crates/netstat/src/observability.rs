//! Observability infrastructure for the netstat agent
//!
//! Provides:
//! - Prometheus metrics (collection latency, interfaces monitored, samples, errors)
//! - Structured JSON logging with tracing

use prometheus::{register_histogram, register_int_counter, register_int_gauge};
use prometheus::{Histogram, IntCounter, IntGauge};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    collection_latency_seconds: Histogram,
    interfaces_monitored: IntGauge,
    samples_emitted: IntCounter,
    collection_errors: IntCounter,
    read_errors: IntCounter,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            collection_latency_seconds: register_histogram!(
                "netstat_agent_collection_latency_seconds",
                "Time spent reading statistics files in one cycle",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register collection_latency_seconds"),

            interfaces_monitored: register_int_gauge!(
                "netstat_agent_interfaces_monitored",
                "Number of interfaces found at initialization"
            )
            .expect("Failed to register interfaces_monitored"),

            samples_emitted: register_int_counter!(
                "netstat_agent_samples_emitted_total",
                "Total number of gauge samples emitted"
            )
            .expect("Failed to register samples_emitted"),

            collection_errors: register_int_counter!(
                "netstat_agent_collection_errors_total",
                "Total number of aborted collection cycles"
            )
            .expect("Failed to register collection_errors"),

            read_errors: register_int_counter!(
                "netstat_agent_read_errors_total",
                "Total number of statistics reads that failed after open"
            )
            .expect("Failed to register read_errors"),
        }
    }
}

/// Agent metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share it.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn observe_collection_latency(&self, duration_secs: f64) {
        self.inner().collection_latency_seconds.observe(duration_secs);
    }

    pub fn set_interfaces_monitored(&self, count: i64) {
        self.inner().interfaces_monitored.set(count);
    }

    pub fn inc_samples_emitted(&self, count: u64) {
        self.inner().samples_emitted.inc_by(count);
    }

    pub fn inc_collection_errors(&self) {
        self.inner().collection_errors.inc();
    }

    pub fn inc_read_errors(&self, count: u64) {
        self.inner().read_errors.inc_by(count);
    }

    pub fn samples_emitted(&self) -> u64 {
        self.inner().samples_emitted.get()
    }

    pub fn collection_errors(&self) -> u64 {
        self.inner().collection_errors.get()
    }
}

/// Structured logger for agent events
///
/// Every record carries a stable `event` field.
#[derive(Clone)]
pub struct StructuredLogger {
    host: String,
}

impl StructuredLogger {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn log_startup(&self, version: &str, net_dir_path: &str, statistics: &str) {
        info!(
            event = "agent_started",
            host = %self.host,
            agent_version = %version,
            net_dir_path = %net_dir_path,
            statistics = %statistics,
            "netstat agent started"
        );
    }

    pub fn log_discovery(&self, net_dir_path: &str, count: usize) {
        if count == 0 {
            warn!(
                event = "interfaces_discovered",
                host = %self.host,
                net_dir_path = %net_dir_path,
                count = count,
                "No interfaces found, collection will emit nothing"
            );
        } else {
            info!(
                event = "interfaces_discovered",
                host = %self.host,
                net_dir_path = %net_dir_path,
                count = count,
                "Interfaces discovered"
            );
        }
    }

    pub fn log_collect_failed(&self, error: &str, consecutive_failures: u64) {
        warn!(
            event = "collect_failed",
            host = %self.host,
            error = %error,
            consecutive_failures = consecutive_failures,
            "Collection cycle aborted, retrying next tick"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            host = %self.host,
            reason = %reason,
            "netstat agent shutting down"
        );
    }
}
