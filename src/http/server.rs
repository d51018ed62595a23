//! HTTP server setup for the balancer.
//!
//! # Responsibilities
//! - Build the balancer router (register, get server, list workers)
//! - Build the load listener router (report load)
//! - Wire up middleware (tracing, timeouts)
//! - Serve both listeners until shutdown

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::collector::LoadCollector;
use crate::config::BalancerConfig;
use crate::http::messages::{
    AckResponse, GetServerResponse, RegisterWorkerRequest, ReportLoadRequest, WorkersResponse,
};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BalancerService, WorkerAddress, WorkerRegistry};

/// Build the balancer-facing router.
#[allow(deprecated)]
pub fn balancer_router(service: Arc<BalancerService>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/v1/workers", post(register_worker).get(list_workers))
        .route("/v1/server", get(get_server))
        .route("/health", get(health))
        .with_state(service)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Build the load listener router.
#[allow(deprecated)]
pub fn load_listener_router(collector: LoadCollector, request_timeout: Duration) -> Router {
    Router::new()
        .route("/v1/load", post(report_load))
        .route("/health", get(health))
        .with_state(collector)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

/// Balancer process: front end plus load listener over one shared registry.
pub struct BalancerServer {
    config: BalancerConfig,
    service: Arc<BalancerService>,
    collector: LoadCollector,
}

impl BalancerServer {
    /// Create a server with an empty registry.
    pub fn new(config: BalancerConfig) -> Self {
        let registry = Arc::new(WorkerRegistry::new());
        let service = Arc::new(BalancerService::new(registry.clone(), config.policy));
        let collector = LoadCollector::new(registry);

        Self {
            config,
            service,
            collector,
        }
    }

    pub fn service(&self) -> Arc<BalancerService> {
        self.service.clone()
    }

    pub fn registry(&self) -> Arc<WorkerRegistry> {
        self.service.registry().clone()
    }

    /// Serve both listeners until `shutdown` fires.
    pub async fn run(
        self,
        balancer_listener: TcpListener,
        load_listener: TcpListener,
        shutdown: &Shutdown,
    ) -> Result<(), std::io::Error> {
        let timeout = Duration::from_secs(self.config.timeouts.request_secs);

        tracing::info!(
            address = %balancer_listener.local_addr()?,
            policy = %self.service.policy(),
            "Load balancing server started"
        );
        tracing::info!(
            address = %load_listener.local_addr()?,
            "Load listener server started"
        );

        let balancer = axum::serve(balancer_listener, balancer_router(self.service.clone(), timeout))
            .with_graceful_shutdown(wait(shutdown.subscribe()));
        let load = axum::serve(load_listener, load_listener_router(self.collector.clone(), timeout))
            .with_graceful_shutdown(wait(shutdown.subscribe()));

        tokio::try_join!(
            async { balancer.await },
            async { load.await },
        )?;

        tracing::info!("HTTP servers stopped");
        Ok(())
    }
}

async fn wait(mut rx: tokio::sync::broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}

async fn register_worker(
    State(service): State<Arc<BalancerService>>,
    Json(req): Json<RegisterWorkerRequest>,
) -> Json<AckResponse> {
    service.register_worker(req.id, WorkerAddress::new(req.ip, req.port));
    Json(AckResponse::ok("Worker Registered Successfully"))
}

async fn get_server(State(service): State<Arc<BalancerService>>) -> impl IntoResponse {
    match service.get_server() {
        Ok(server) => (StatusCode::OK, Json(GetServerResponse::found(server))),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, Json(GetServerResponse::unavailable(e.to_string()))),
    }
}

async fn list_workers(State(service): State<Arc<BalancerService>>) -> Json<WorkersResponse> {
    Json(WorkersResponse {
        workers: service.registry().snapshot(),
    })
}

async fn report_load(
    State(collector): State<LoadCollector>,
    Json(req): Json<ReportLoadRequest>,
) -> Json<AckResponse> {
    collector.report_load(req.id, req.load);
    Json(AckResponse::ok("Load reported successfully"))
}

async fn health() -> &'static str {
    "ok"
}
