//! Compute tasks served by a worker.

use std::time::Duration;

use crate::http::messages::{ComputeRequest, ComputeResponse, ERR_FAILED, ERR_OK};

/// Kinds of work a client can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeKind {
    /// Sum of 1..=n.
    SumToN,
    /// Sleep for n seconds.
    SleepForSeconds,
}

impl TryFrom<i32> for ComputeKind {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ComputeKind::SumToN),
            2 => Ok(ComputeKind::SleepForSeconds),
            other => Err(other),
        }
    }
}

impl From<ComputeKind> for i32 {
    fn from(kind: ComputeKind) -> Self {
        match kind {
            ComputeKind::SumToN => 1,
            ComputeKind::SleepForSeconds => 2,
        }
    }
}

/// Run one compute request. Unknown kinds are answered, never panicked on.
pub async fn execute(req: &ComputeRequest) -> ComputeResponse {
    let kind = match ComputeKind::try_from(req.kind) {
        Ok(kind) => kind,
        Err(kind) => {
            tracing::warn!(kind, "Invalid compute request type");
            return ComputeResponse {
                err_code: ERR_FAILED,
                msg: "Invalid request type".to_string(),
                result: -1,
            };
        }
    };

    tracing::info!(?kind, n = req.n, "Received compute request");
    let result = match kind {
        ComputeKind::SumToN => sum_to_n(req.n),
        ComputeKind::SleepForSeconds => {
            let secs = u64::try_from(req.n).unwrap_or(0);
            tokio::time::sleep(Duration::from_secs(secs)).await;
            0
        }
    };

    ComputeResponse {
        err_code: ERR_OK,
        msg: "Success".to_string(),
        result,
    }
}

/// `1 + 2 + ... + n`, saturating at `i64::MAX`; zero for `n <= 0`.
pub fn sum_to_n(n: i64) -> i64 {
    if n <= 0 {
        return 0;
    }
    let n = i128::from(n);
    i64::try_from(n * (n + 1) / 2).unwrap_or(i64::MAX)
}
