//! Worker process subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     publish.rs → publish the `worker` service to Consul (retry with backoff)
//!     agent.rs → register with the balancer (retry with backoff)
//!
//! Client compute request (POST /v1/compute)
//!     → server.rs → task.rs (sum to n / sleep) → JSON result
//!
//! Every poll interval:
//!     probe.rs (process CPU %) → agent.rs → balancer load listener
//! ```

pub mod agent;
pub mod probe;
pub mod publish;
pub mod server;
pub mod task;

pub use agent::{AgentError, WorkerAgent};
pub use probe::{CpuProbe, FixedProbe, LoadProbe};
pub use publish::{ServiceDefinition, ServicePublisher};
pub use server::worker_router;
pub use task::{ComputeKind, execute};
