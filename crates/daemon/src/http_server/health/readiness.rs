use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::*;

const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    let result = match timeout(READINESS_TIMEOUT, data_src.is_ready()).await {
        Ok(result) => result,
        Err(_) => return unavailable("readiness check timed out"),
    };

    match result {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response(),
        Err(DataSourceError::DependencyFailure) => unavailable("database is not available"),
        Err(DataSourceError::ShuttingDown) => unavailable("service is shutting down"),
    }
}

fn unavailable(message: &str) -> Response {
    let msg = serde_json::json!({"status": "failure", "message": message});
    (StatusCode::SERVICE_UNAVAILABLE, Json(msg)).into_response()
}
