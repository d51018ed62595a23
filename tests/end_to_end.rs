//! Balancer, worker agent and client over real sockets.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use compute_balancer::compute::{FixedProbe, WorkerAgent, worker_router};
use compute_balancer::config::WorkerConfig;
use compute_balancer::health::{HealthMonitor, StaticLiveness};
use compute_balancer::http::messages::{ComputeRequest, ComputeResponse, GetServerResponse};
use compute_balancer::lifecycle::shutdown::persist_load_samples;
use compute_balancer::load_balancer::WorkerAddress;
use compute_balancer::{BalancerConfig, BalancerServer, Policy, Shutdown};

mod common;

async fn start_worker() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, worker_router()).await;
    });
    port
}

#[tokio::test]
async fn test_register_report_select_and_flush() {
    let (balancer_listener, load_listener) = common::bind_adjacent().await;
    let balancer_port = balancer_listener.local_addr().unwrap().port();

    let mut config = BalancerConfig::default();
    config.policy = Policy::LeastLoaded;
    let health_config = config.health_check.clone();

    let server = BalancerServer::new(config);
    let registry = server.registry();
    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(async move {
        server.run(balancer_listener, load_listener, &server_shutdown).await
    });

    // Two workers register through their agents.
    let mut agents = Vec::new();
    for id in 1..=2 {
        let port = start_worker().await;
        let agent = WorkerAgent::new(WorkerConfig {
            id,
            host: "127.0.0.1".into(),
            port,
            poll_interval_secs: 1,
            balancer_host: "127.0.0.1".into(),
            balancer_port,
            request_timeout_secs: 5,
            consul_url: None,
        })
        .unwrap();
        let mut rx = shutdown.subscribe();
        agent.register_with_retry(&mut rx).await.unwrap();
        agents.push(agent);
    }
    agents[0].report_load(80).await.unwrap();
    agents[1].report_load(20).await.unwrap();

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let base = format!("http://127.0.0.1:{}", balancer_port);

    let server: GetServerResponse = client.get(format!("{}/v1/server", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(server.id, Some(2));

    // The client calls the chosen worker directly.
    let res: ComputeResponse = client
        .post(format!("http://{}:{}/v1/compute", server.ip.unwrap(), server.port.unwrap()))
        .json(&ComputeRequest { kind: 1, n: 4 })
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(res.result, 10);

    // Liveness drops worker 2; least-loaded falls back to worker 1.
    let worker1 = registry.snapshot()[0].address.clone();
    let monitor = HealthMonitor::new(registry.clone(), StaticLiveness::new([worker1]), &health_config);
    monitor.run_cycle().await;

    let server: GetServerResponse = client.get(format!("{}/v1/server", base)).send().await.unwrap().json().await.unwrap();
    assert_eq!(server.id, Some(1));

    // Nobody alive.
    let monitor = HealthMonitor::new(registry.clone(), StaticLiveness::new(Vec::<WorkerAddress>::new()), &health_config);
    monitor.run_cycle().await;
    let res = client.get(format!("{}/v1/server", base)).send().await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("load.json");
    assert!(persist_load_samples(&registry, &path));
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, serde_json::json!({"1": [80], "2": [20]}));
}

#[tokio::test]
async fn test_load_reporter_stops_on_shutdown() {
    let (balancer_listener, load_listener) = common::bind_adjacent().await;
    let balancer_port = balancer_listener.local_addr().unwrap().port();

    let server = BalancerServer::new(BalancerConfig::default());
    let registry = server.registry();
    registry.register(5, WorkerAddress::new("127.0.0.1", 1));
    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(balancer_listener, load_listener, &server_shutdown).await;
    });

    let agent = WorkerAgent::new(WorkerConfig {
        id: 5,
        balancer_host: "127.0.0.1".into(),
        balancer_port,
        poll_interval_secs: 1,
        ..WorkerConfig::default()
    })
    .unwrap();

    let reporter_shutdown = Arc::new(Shutdown::new());
    let reporter = tokio::spawn(agent.run_load_reporter(FixedProbe(30), reporter_shutdown.subscribe()));

    // The first tick fires immediately.
    for _ in 0..50 {
        if registry.snapshot()[0].load == 30 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(registry.snapshot()[0].load, 30);

    reporter_shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(2), reporter).await.unwrap().unwrap();
    shutdown.trigger();
}
