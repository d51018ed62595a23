//! Service publication to the Consul agent.
//!
//! The balancer's health monitor asks Consul which `worker` services pass
//! their checks. A worker only shows up there once it has published itself
//! with an HTTP check against its own `/health` endpoint.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::compute::agent::{AgentError, retry_until_shutdown};
use crate::config::WorkerConfig;

/// Consul service name the balancer queries.
pub const SERVICE_NAME: &str = "worker";

/// Body of `PUT /v1/agent/service/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceDefinition {
    pub name: String,
    #[serde(rename = "ID")]
    pub id: String,
    pub address: String,
    pub port: u16,
    pub check: HttpCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HttpCheck {
    #[serde(rename = "HTTP")]
    pub http: String,
    /// Go duration string, e.g. `10s`.
    pub interval: String,
}

impl ServiceDefinition {
    /// `w-<id>` on the worker's advertised address, checked every poll interval.
    pub fn for_worker(config: &WorkerConfig) -> Self {
        Self {
            name: SERVICE_NAME.to_string(),
            id: format!("w-{}", config.id),
            address: config.host.clone(),
            port: config.port,
            check: HttpCheck {
                http: config.health_url(),
                interval: format!("{}s", config.poll_interval_secs),
            },
        }
    }
}

/// Publishes one worker's service definition to a Consul agent.
#[derive(Debug, Clone)]
pub struct ServicePublisher {
    client: reqwest::Client,
    agent_url: String,
    worker_id: u32,
    definition: ServiceDefinition,
}

impl ServicePublisher {
    pub fn new(agent_url: impl Into<String>, config: &WorkerConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            agent_url: agent_url.into().trim_end_matches('/').to_string(),
            worker_id: config.id,
            definition: ServiceDefinition::for_worker(config),
        })
    }

    pub fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Publish once. Re-publishing the same id replaces the previous entry.
    pub async fn publish(&self) -> Result<(), AgentError> {
        self.client
            .put(format!("{}/v1/agent/service/register", self.agent_url))
            .json(&self.definition)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Publish, retrying with backoff until it succeeds or shutdown fires.
    pub async fn publish_with_retry(&self, shutdown: &mut broadcast::Receiver<()>) -> Result<(), AgentError> {
        retry_until_shutdown(self.worker_id, "consul", shutdown, || self.publish()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_wire_format() {
        let config = WorkerConfig {
            id: 3,
            host: "localhost".into(),
            port: 50063,
            poll_interval_secs: 7,
            ..WorkerConfig::default()
        };
        let json = serde_json::to_value(ServiceDefinition::for_worker(&config)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "Name": "worker",
                "ID": "w-3",
                "Address": "localhost",
                "Port": 50063,
                "Check": {"HTTP": "http://localhost:50063/health", "Interval": "7s"}
            })
        );
    }
}
