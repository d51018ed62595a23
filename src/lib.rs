//! Compute request load balancer.
//!
//! Workers register with the balancer and report their load; clients ask the
//! balancer for a server and send their compute requests straight to it.

pub mod collector;
pub mod compute;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::schema::BalancerConfig;
pub use http::BalancerServer;
pub use lifecycle::Shutdown;
pub use load_balancer::{BalancerService, Policy, WorkerRegistry};
