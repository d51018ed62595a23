//! Worker side of the balancer protocol.
//!
//! # Responsibilities
//! - Register the worker with the balancer
//! - Report load to the load listener on a fixed interval
//! - Retry registrations with backoff (shared with `publish.rs`)

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::compute::probe::LoadProbe;
use crate::config::WorkerConfig;
use crate::http::messages::{AckResponse, ERR_OK, RegisterWorkerRequest, ReportLoadRequest};
use crate::resilience::Backoff;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("balancer rejected request (err_code {code}): {msg}")]
    Rejected { code: i32, msg: String },
    #[error("shutdown requested")]
    Shutdown,
}

/// Talks to the balancer on behalf of one worker.
#[derive(Debug, Clone)]
pub struct WorkerAgent {
    config: WorkerConfig,
    client: reqwest::Client,
}

impl WorkerAgent {
    pub fn new(config: WorkerConfig) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Register once.
    pub async fn register(&self) -> Result<(), AgentError> {
        let req = RegisterWorkerRequest {
            id: self.config.id,
            ip: self.config.host.clone(),
            port: self.config.port,
        };
        let ack: AckResponse = self
            .client
            .post(format!("{}/v1/workers", self.config.balancer_url()))
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check(ack)
    }

    /// Register, retrying with backoff until it succeeds or shutdown fires.
    pub async fn register_with_retry(&self, shutdown: &mut broadcast::Receiver<()>) -> Result<(), AgentError> {
        retry_until_shutdown(self.config.id, "load balancer", shutdown, || self.register()).await
    }

    /// Send one load report.
    pub async fn report_load(&self, load: i64) -> Result<(), AgentError> {
        let req = ReportLoadRequest {
            id: self.config.id,
            load,
        };
        let ack: AckResponse = self
            .client
            .post(format!("{}/v1/load", self.config.load_listener_url()))
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check(ack)
    }

    /// Report `probe` readings every poll interval until shutdown.
    ///
    /// Failed reports are logged and the loop carries on.
    pub async fn run_load_reporter<P: LoadProbe>(self, mut probe: P, mut shutdown: broadcast::Receiver<()>) {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let mut ticker = tokio::time::interval(interval);
        tracing::info!(worker_id = self.config.id, interval_secs = interval.as_secs(), "Load reporting started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let load = probe.sample();
                    match self.report_load(load).await {
                        Ok(()) => tracing::debug!(worker_id = self.config.id, load, "Load reported to load balancer"),
                        Err(e) => tracing::warn!(worker_id = self.config.id, error = %e, "Load report failed"),
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Load reporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Run `call` until it succeeds, sleeping with exponential backoff between
/// failures. Gives up with [`AgentError::Shutdown`] once shutdown fires.
pub(crate) async fn retry_until_shutdown<F, Fut>(
    worker_id: u32,
    target: &'static str,
    shutdown: &mut broadcast::Receiver<()>,
    mut call: F,
) -> Result<(), AgentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), AgentError>>,
{
    let mut backoff = Backoff::new(Duration::from_millis(250), Duration::from_secs(10));
    loop {
        match call().await {
            Ok(()) => {
                tracing::info!(worker_id, target, attempts = backoff.attempts() + 1, "Worker registered");
                return Ok(());
            }
            Err(e) => {
                let delay = backoff.next_delay();
                tracing::warn!(worker_id, target, error = %e, retry_in = ?delay, "Registration failed");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.recv() => return Err(AgentError::Shutdown),
                }
            }
        }
    }
}

fn check(ack: AckResponse) -> Result<(), AgentError> {
    if ack.err_code == ERR_OK {
        Ok(())
    } else {
        Err(AgentError::Rejected {
            code: ack.err_code,
            msg: ack.msg,
        })
    }
}
