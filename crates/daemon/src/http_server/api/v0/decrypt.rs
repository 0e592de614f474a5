use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};

use common::custody::{DecryptRequest, DecryptResponse};

use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::CustodyApiError;
use crate::ServiceState;

/// Decrypt one share encrypted to this node's key
pub async fn handler(
    State(state): State<ServiceState>,
    payload: Result<Json<DecryptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, CustodyApiError> {
    let Json(req) = payload?;

    let decrypted_share = state.custodian().decrypt_share(&req).await?;
    tracing::debug!(
        custodian_url = %req.encrypted_share.custodian_url,
        "decrypted share"
    );

    Ok((http::StatusCode::OK, Json(DecryptResponse { decrypted_share })).into_response())
}

impl ApiRequest for DecryptRequest {
    type Response = DecryptResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/decrypt").unwrap();
        client.post(full_url).json(&self)
    }
}

#[cfg(test)]
mod tests {
    use common::crypto::{HybridCipher, Kdf};
    use common::custody::EncryptedShare;
    use common::prelude::{ErrorKind, SecretKey};
    use common::testkit::TestWallet;

    use super::*;
    use crate::http_server::api::v0::{json_body, test_state};
    use crate::http_server::api::ErrorBody;
    use crate::ServiceConfig;

    fn share_for(key: &SecretKey, wallet: &TestWallet) -> EncryptedShare {
        EncryptedShare {
            custodian_url: "node-1.example".to_string(),
            payload: HybridCipher::encrypt(&key.public(), b"\x01share", Kdf::Legacy).unwrap(),
            acl: [wallet.identity()].into_iter().collect(),
        }
    }

    fn config_with(key: &SecretKey, enforce: bool) -> ServiceConfig {
        ServiceConfig {
            node_secret: Some(key.clone()),
            enforce_custodian_auth: enforce,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_decrypts_own_share() {
        let key = SecretKey::generate();
        let wallet = TestWallet::generate();
        let state = test_state(&config_with(&key, false)).await;

        let request = DecryptRequest {
            encrypted_share: share_for(&key, &wallet),
            authorization: None,
        };
        let response = handler(State(state), Ok(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), http::StatusCode::OK);

        let body: DecryptResponse = json_body(response).await;
        assert_eq!(body.decrypted_share, b"\x01share");
    }

    #[tokio::test]
    async fn test_wrong_key_is_decryption_error() {
        let key = SecretKey::generate();
        let other = SecretKey::generate();
        let wallet = TestWallet::generate();
        let state = test_state(&config_with(&key, false)).await;

        let request = DecryptRequest {
            encrypted_share: share_for(&other, &wallet),
            authorization: None,
        };
        let response = handler(State(state), Ok(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
        let body: ErrorBody = json_body(response).await;
        assert_eq!(body.kind, ErrorKind::DecryptionError);
    }

    #[tokio::test]
    async fn test_no_key_is_not_configured() {
        let key = SecretKey::generate();
        let wallet = TestWallet::generate();
        let state = test_state(&ServiceConfig::default()).await;

        let request = DecryptRequest {
            encrypted_share: share_for(&key, &wallet),
            authorization: None,
        };
        let response = handler(State(state), Ok(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), http::StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorBody = json_body(response).await;
        assert_eq!(body.kind, ErrorKind::NotConfigured);
    }

    #[tokio::test]
    async fn test_enforced_auth() {
        let key = SecretKey::generate();
        let wallet = TestWallet::generate();
        let stranger = TestWallet::generate();
        let state = test_state(&config_with(&key, true)).await;
        let share = share_for(&key, &wallet);

        let missing = DecryptRequest {
            encrypted_share: share.clone(),
            authorization: None,
        };
        let response = handler(State(state.clone()), Ok(Json(missing)))
            .await
            .into_response();
        assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);

        let foreign = DecryptRequest {
            encrypted_share: share.clone(),
            authorization: Some(stranger.recovery_request("k1", "n1").authorization()),
        };
        let response = handler(State(state.clone()), Ok(Json(foreign)))
            .await
            .into_response();
        assert_eq!(response.status(), http::StatusCode::FORBIDDEN);

        let allowed = DecryptRequest {
            encrypted_share: share,
            authorization: Some(wallet.recovery_request("k1", "n1").authorization()),
        };
        let response = handler(State(state), Ok(Json(allowed)))
            .await
            .into_response();
        assert_eq!(response.status(), http::StatusCode::OK);
    }
}
