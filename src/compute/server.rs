//! HTTP surface of a worker.

use axum::{
    Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::compute::task::execute;
use crate::http::messages::{ComputeRequest, ERR_OK};

/// Routes: `POST /v1/compute`, `GET /health`.
pub fn worker_router() -> Router {
    Router::new()
        .route("/v1/compute", post(compute))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

async fn compute(Json(req): Json<ComputeRequest>) -> impl IntoResponse {
    let response = execute(&req).await;
    let status = if response.err_code == ERR_OK {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(response))
}

async fn health() -> &'static str {
    "ok"
}
