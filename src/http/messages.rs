//! Wire messages shared by the balancer, workers and the CLI.
//!
//! Every response carries `err_code` (0 = success) and a human-readable `msg`.

use serde::{Deserialize, Serialize};

use crate::load_balancer::{ServerInfo, WorkerId, worker::Worker};

pub const ERR_OK: i32 = 0;
pub const ERR_FAILED: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    pub id: WorkerId,
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLoadRequest {
    pub id: WorkerId,
    /// Percent; values outside 0-100 are clamped by the balancer.
    pub load: i64,
}

/// Plain acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub err_code: i32,
    pub msg: String,
}

impl AckResponse {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            err_code: ERR_OK,
            msg: msg.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetServerResponse {
    pub err_code: i32,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WorkerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl GetServerResponse {
    pub fn found(server: ServerInfo) -> Self {
        Self {
            err_code: ERR_OK,
            msg: "Server found".to_string(),
            id: Some(server.id),
            ip: Some(server.address.host),
            port: Some(server.address.port),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            err_code: ERR_FAILED,
            msg: reason.into(),
            id: None,
            ip: None,
            port: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkersResponse {
    pub workers: Vec<Worker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// 1 = sum to n, 2 = sleep for n seconds.
    #[serde(rename = "type")]
    pub kind: i32,
    pub n: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResponse {
    pub err_code: i32,
    pub msg: String,
    pub result: i64,
}
