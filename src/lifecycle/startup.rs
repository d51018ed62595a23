//! Startup orchestration.
//!
//! Subsystems initialize in order: listeners are bound first so a port
//! conflict fails the process before any background task starts.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::BalancerConfig;
use crate::health::{ConsulLiveness, HealthMonitor, LivenessError, LivenessSource};
use crate::lifecycle::Shutdown;
use crate::load_balancer::WorkerRegistry;

/// Bind the balancer port and the load listener on `port + 1`.
pub async fn bind_listeners(config: &BalancerConfig) -> std::io::Result<(TcpListener, TcpListener)> {
    let balancer = TcpListener::bind(config.listener.balancer_address()).await?;
    let load = TcpListener::bind(config.listener.load_listener_address()).await?;
    Ok((balancer, load))
}

/// Liveness source described by the health check config.
pub fn consul_liveness(config: &BalancerConfig) -> Result<ConsulLiveness, LivenessError> {
    ConsulLiveness::new(
        config.health_check.liveness_url.clone(),
        std::time::Duration::from_secs(config.health_check.timeout_secs),
    )
}

/// Spawn the health monitor unless health checks are disabled.
pub fn spawn_health_monitor<L: LivenessSource>(
    config: &BalancerConfig,
    registry: Arc<WorkerRegistry>,
    source: L,
    shutdown: &Shutdown,
) -> Option<JoinHandle<()>> {
    if !config.health_check.enabled {
        tracing::info!("Health checks disabled");
        return None;
    }
    let monitor = HealthMonitor::new(registry, source, &config.health_check);
    let rx = shutdown.subscribe();
    tracing::info!("Health check task started");
    Some(tokio::spawn(monitor.run(rx)))
}
