//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::load_balancer::Policy;

/// Root configuration for the balancer process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (balancer port, load listener on port + 1).
    pub listener: ListenerConfig,

    /// Worker selection policy: "rr", "ll" or "pf".
    pub policy: Policy,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Where load samples go on shutdown.
    pub persistence: PersistenceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Balancer port. The load listener binds `port + 1`.
    pub port: u16,
}

impl ListenerConfig {
    pub fn balancer_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn load_listener_address(&self) -> String {
        format!("{}:{}", self.host, self.port.saturating_add(1))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50051,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the periodic health monitor.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Upper bound on one liveness query, in seconds.
    pub timeout_secs: u64,

    /// Liveness endpoint (Consul health API for the worker service).
    pub liveness_url: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
            liveness_url: "http://localhost:8500/v1/health/service/worker".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout for balancer endpoints in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Load sample persistence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Flush samples on shutdown.
    pub enabled: bool,

    /// JSON file written on shutdown.
    pub load_dump_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            load_dump_path: PathBuf::from("test_files/load.json"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for terminals, JSON for log shipping.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Settings of a worker process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Identity the worker registers under.
    pub id: u32,

    /// Host the worker advertises and binds.
    pub host: String,

    /// Compute port.
    pub port: u16,

    /// Seconds between load reports.
    pub poll_interval_secs: u64,

    /// Balancer host.
    pub balancer_host: String,

    /// Balancer port; load reports go to `balancer_port + 1`.
    pub balancer_port: u16,

    /// Timeout for calls to the balancer, in seconds.
    pub request_timeout_secs: u64,

    /// Consul agent the worker publishes its service to; `None` skips publishing.
    pub consul_url: Option<String>,
}

impl WorkerConfig {
    pub fn balancer_url(&self) -> String {
        format!("http://{}:{}", self.balancer_host, self.balancer_port)
    }

    pub fn load_listener_url(&self) -> String {
        format!("http://{}:{}", self.balancer_host, self.balancer_port.saturating_add(1))
    }

    /// Endpoint the liveness source probes on this worker.
    pub fn health_url(&self) -> String {
        format!("http://{}:{}/health", self.host, self.port)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: 1,
            host: "localhost".to_string(),
            port: 50061,
            poll_interval_secs: 10,
            balancer_host: "localhost".to_string(),
            balancer_port: 50051,
            request_timeout_secs: 5,
            consul_url: Some("http://localhost:8500".to_string()),
        }
    }
}
