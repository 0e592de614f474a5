use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::ServiceState;

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityResponse {
    /// The node's configured name
    pub node_id: String,
    /// Hex Ed25519 key shares are encrypted to, if this node is a custodian
    pub public_key: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn handler(State(state): State<ServiceState>) -> Response {
    let response = IdentityResponse {
        node_id: state.node_id().to_string(),
        public_key: state.public_key().map(|key| key.to_hex()),
    };
    (StatusCode::OK, Json(response)).into_response()
}
