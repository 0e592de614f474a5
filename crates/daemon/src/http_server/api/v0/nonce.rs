use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{CustodyError, Identity};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::CustodyApiError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct NonceRequest {
    /// Address of the wallet that will sign the recovery message
    #[arg(long)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
}

/// Issue a fresh nonce for an address, superseding any earlier one
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<NonceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CustodyApiError> {
    let Json(req) = payload?;

    let identity = Identity::new(&req.address);
    if identity.is_empty() {
        return Err(CustodyError::InvalidInput("address is required".to_string()).into());
    }

    let nonce = state
        .sessions()
        .issue(&identity)
        .await
        .map_err(CustodyError::from)?;

    Ok((http::StatusCode::OK, Json(NonceResponse { nonce })).into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for NonceRequest {
    type Response = NonceResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/nonce").unwrap();
        client.post(full_url).json(&self)
    }
}
