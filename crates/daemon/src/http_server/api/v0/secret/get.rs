use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{CustodyError, RecoveryRequest};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::CustodyApiError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct GetRequest {
    /// Key the secret is stored under
    #[arg(long)]
    pub key: String,

    /// Signature over the message, in the chain's encoding
    #[arg(long)]
    pub signature: String,

    /// The signed JSON message: {nonce, timestamp, address|rawaddress, chain}
    #[arg(long)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub key: String,
    pub recovered: String,
}

/// Authorize the caller and reassemble the secret from a custodian quorum
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<GetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CustodyApiError> {
    let Json(req) = payload?;

    let request = RecoveryRequest {
        key: req.key,
        signature: req.signature,
        message: req.message,
    };
    let secret = state.recoverer().recover(&request).await?;
    let recovered = String::from_utf8(secret).map_err(|_| {
        CustodyError::Reconstruction("recovered secret is not valid UTF-8".to_string())
    })?;

    Ok((
        http::StatusCode::OK,
        Json(GetResponse {
            key: request.key,
            recovered,
        }),
    )
        .into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for GetRequest {
    type Response = GetResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/secret/get").unwrap();
        client.post(full_url).json(&self)
    }
}
