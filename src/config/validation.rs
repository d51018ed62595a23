//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::BalancerConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must leave room for the load listener on port + 1 (got {0})")]
    PortOutOfRange(u16),
    #[error("listener.host must not be empty")]
    EmptyHost,
    #[error("health_check.interval_secs must be > 0")]
    ZeroInterval,
    #[error("health_check.timeout_secs must be > 0")]
    ZeroTimeout,
    #[error("health_check.liveness_url must start with http:// or https:// (got '{0}')")]
    InvalidLivenessUrl(String),
    #[error("timeouts.request_secs must be > 0")]
    ZeroRequestTimeout,
    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check value ranges and cross-field constraints.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Port 0 would make the load listener port meaningless.
    if config.listener.port == 0 || config.listener.port == u16::MAX {
        errors.push(ValidationError::PortOutOfRange(config.listener.port));
    }
    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    let health = &config.health_check;
    if health.interval_secs == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if health.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if health.enabled
        && !(health.liveness_url.starts_with("http://") || health.liveness_url.starts_with("https://"))
    {
        errors.push(ValidationError::InvalidLivenessUrl(health.liveness_url.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::UnknownLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
