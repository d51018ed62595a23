//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! Worker / client request (JSON)
//!     → server.rs (Axum routers, tracing + timeout layers)
//!     → messages.rs (request/response envelopes)
//!     → load_balancer::BalancerService or collector::LoadCollector
//!     → JSON response with err_code + msg
//! ```

pub mod messages;
pub mod server;

pub use server::BalancerServer;
