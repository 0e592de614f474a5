use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::HeaderMap, header::HeaderValue, Client};

use common::custody::{
    custodian_endpoint, CustodianClient, CustodianError, DecryptRequest, DecryptResponse,
};

use crate::http_server::api::ErrorBody;

/// Reaches remote custodians over their HTTP decrypt endpoint
#[derive(Debug, Clone)]
pub struct HttpCustodianClient {
    client: Client,
}

impl HttpCustodianClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl CustodianClient for HttpCustodianClient {
    async fn decrypt(&self, request: DecryptRequest) -> Result<DecryptResponse, CustodianError> {
        let url = request.encrypted_share.custodian_url.clone();
        let endpoint = custodian_endpoint(&url).map_err(|e| CustodianError::Unreachable {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<DecryptResponse>()
                .await
                .map_err(|e| transport_error(&url, e));
        }

        // a custodian running this daemon answers with a structured error
        let text = response.text().await.map_err(|e| transport_error(&url, e))?;
        match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Err(CustodianError::Refused {
                url,
                kind: body.kind,
                message: body.message,
            }),
            Err(_) => Err(CustodianError::Unreachable {
                url,
                reason: format!("HTTP status {}: {}", status, text),
            }),
        }
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> CustodianError {
    if e.is_timeout() {
        CustodianError::Timeout {
            url: url.to_string(),
        }
    } else {
        CustodianError::Unreachable {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}
