//! Compute request load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                  BALANCER                     │
//!   Worker register ──────┼─▶ :port   ┌─────────────┐                     │
//!   Client get-server ────┼─▶ (http)─▶│  service    │──┐                  │
//!                         │           └─────────────┘  │  ┌────────────┐  │
//!                         │                            ├─▶│  registry  │  │
//!   Worker load report ───┼─▶ :port+1 ┌─────────────┐  │  │ + cursor   │  │
//!                         │   (http)─▶│  collector  │──┤  │ + samples  │  │
//!                         │           └─────────────┘  │  └────────────┘  │
//!                         │           ┌─────────────┐  │                  │
//!   Liveness source ◀─────┼───────────│   health    │──┘                  │
//!   (e.g. Consul)         │           │   monitor   │                     │
//!                         │           └─────────────┘                     │
//!                         └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use compute_balancer::config::loader::load_config;
use compute_balancer::config::validation::validate_config;
use compute_balancer::config::watcher::ConfigWatcher;
use compute_balancer::lifecycle::{shutdown::persist_load_samples, signals, startup};
use compute_balancer::observability::{logging, metrics};
use compute_balancer::{BalancerConfig, BalancerServer, Policy, Shutdown};

#[derive(Parser)]
#[command(name = "balancer")]
#[command(about = "Load balancer for compute workers", long_about = None)]
struct Args {
    /// TOML configuration file. The selection policy is reloaded when it changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the load balancer; the load listener uses port + 1.
    #[arg(long)]
    port: Option<u16>,

    /// Health check interval in seconds.
    #[arg(long)]
    interval: Option<u64>,

    /// Selection policy: rr (round-robin), ll (least-loaded), pf (pick-first).
    #[arg(long)]
    policy: Option<Policy>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    if let Some(port) = args.port {
        config.listener.port = port;
    }
    if let Some(interval) = args.interval {
        config.health_check.interval_secs = interval;
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            eprintln!("invalid configuration: {}", e);
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    logging::init(&config.observability);
    tracing::info!(
        port = config.listener.port,
        interval_secs = config.health_check.interval_secs,
        policy = %config.policy,
        "balancer v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let (balancer_listener, load_listener) = startup::bind_listeners(&config).await?;

    let shutdown = Arc::new(Shutdown::new());
    let server = BalancerServer::new(config.clone());
    let registry = server.registry();

    let monitor = startup::spawn_health_monitor(
        &config,
        registry.clone(),
        startup::consul_liveness(&config)?,
        &shutdown,
    );

    // Keep the watcher alive for the lifetime of the server.
    let _watcher = match &args.config {
        Some(path) => {
            let service = server.service();
            match ConfigWatcher::new(path).spawn(move |new| service.set_policy(new.policy)) {
                Ok(w) => Some(w),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload unavailable");
                    None
                }
            }
        }
        None => None,
    };

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        signal_shutdown.trigger();
    });

    server.run(balancer_listener, load_listener, &shutdown).await?;

    if let Some(handle) = monitor {
        let _ = handle.await;
    }
    if config.persistence.enabled {
        persist_load_samples(&registry, &config.persistence.load_dump_path);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
