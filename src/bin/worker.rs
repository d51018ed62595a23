//! Compute worker.
//!
//! Serves compute requests, publishes itself to Consul, registers with the
//! balancer and reports its CPU load every poll interval.

use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

use compute_balancer::compute::{CpuProbe, ServicePublisher, WorkerAgent, worker_router};
use compute_balancer::config::{ObservabilityConfig, WorkerConfig};
use compute_balancer::lifecycle::{Shutdown, signals};
use compute_balancer::observability::logging;

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Compute worker for the load balancer", long_about = None)]
struct Args {
    /// Port number for the worker.
    #[arg(long)]
    port: u16,

    /// Worker ID.
    #[arg(long)]
    id: u32,

    /// Seconds between load reports.
    #[arg(long, default_value_t = 10)]
    interval: u64,

    /// Host the worker binds and advertises.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Balancer host.
    #[arg(long, default_value = "localhost")]
    balancer: String,

    /// Balancer port; load reports go to port + 1.
    #[arg(long, default_value_t = 50051)]
    balancer_port: u16,

    /// Consul agent the worker service is published to.
    #[arg(long, default_value = "http://localhost:8500")]
    consul: String,

    /// Do not publish the worker service to Consul.
    #[arg(long)]
    no_consul: bool,

    /// Log level.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if args.interval == 0 {
        return Err("--interval must be > 0".into());
    }

    logging::init(&ObservabilityConfig {
        log_level: args.log_level.clone(),
        ..ObservabilityConfig::default()
    });

    let config = WorkerConfig {
        id: args.id,
        host: args.host,
        port: args.port,
        poll_interval_secs: args.interval,
        balancer_host: args.balancer,
        balancer_port: args.balancer_port,
        consul_url: (!args.no_consul).then_some(args.consul),
        ..WorkerConfig::default()
    };

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(worker_id = config.id, address = %listener.local_addr()?, "Worker server started");

    let shutdown = Arc::new(Shutdown::new());
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        signal_shutdown.trigger();
    });

    // Published concurrently so a missing Consul agent never blocks balancer registration.
    let publisher = match &config.consul_url {
        Some(url) => {
            let publisher = ServicePublisher::new(url.as_str(), &config)?;
            tracing::info!(
                service_id = %publisher.definition().id,
                check = %publisher.definition().check.http,
                "Publishing worker service to Consul"
            );
            let mut publish_shutdown = shutdown.subscribe();
            Some(tokio::spawn(async move {
                let _ = publisher.publish_with_retry(&mut publish_shutdown).await;
            }))
        }
        None => None,
    };

    let agent = WorkerAgent::new(config)?;
    let mut server_shutdown = shutdown.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(listener, worker_router())
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await
    });

    let mut register_shutdown = shutdown.subscribe();
    if agent.register_with_retry(&mut register_shutdown).await.is_ok() {
        agent.run_load_reporter(CpuProbe::new(), shutdown.subscribe()).await;
    }

    server.await??;
    if let Some(handle) = publisher {
        let _ = handle.await;
    }
    tracing::info!("Worker stopped");
    Ok(())
}
