use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{Acl, Identity};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::CustodyApiError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct SetRequest {
    /// Key to store the secret under
    #[arg(long)]
    pub key: String,

    /// The secret itself
    #[arg(long)]
    pub value: String,

    /// Addresses allowed to recover the secret (repeatable)
    #[arg(long)]
    #[serde(default)]
    pub acl: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetResponse {
    pub key: String,
    /// Custodian URLs holding a share, in assignment order
    pub custodians: Vec<String>,
    pub threshold: u8,
}

/// Split a secret across the registered custodians
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<SetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CustodyApiError> {
    let Json(req) = payload?;
    tracing::info!(key = %req.key, acl = req.acl.len(), "distributing secret");

    let acl: Acl = req
        .acl
        .iter()
        .map(|address| Identity::new(address))
        .filter(|identity| !identity.is_empty())
        .collect();

    let record = state
        .distributor()
        .distribute(&req.key, req.value.as_bytes(), acl)
        .await?;

    Ok((
        http::StatusCode::CREATED,
        Json(SetResponse {
            key: record.key,
            custodians: record
                .shares
                .into_iter()
                .map(|share| share.custodian_url)
                .collect(),
            threshold: record.threshold,
        }),
    )
        .into_response())
}

// Client implementation - builds request for this operation
impl ApiRequest for SetRequest {
    type Response = SetResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/secret").unwrap();
        client.post(full_url).json(&self)
    }
}
