use axum::routing::post;
use axum::Router;

pub mod decrypt;
pub mod nonce;
pub mod secret;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/secret", secret::router(state.clone()))
        .route("/nonce", post(nonce::handler))
        .route("/decrypt", post(decrypt::handler))
        .with_state(state)
}

#[cfg(test)]
pub(crate) use tests::{json_body, test_state, test_state_with_client};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::response::Response;
    use common::custody::CustodianClient;
    use common::testkit::LocalCustodianClient;
    use serde::de::DeserializeOwned;

    use crate::database::Database;
    use crate::{ServiceConfig, ServiceState};

    /// Service state over an in-memory database with no reachable custodians
    pub(crate) async fn test_state(config: &ServiceConfig) -> ServiceState {
        test_state_with_client(config, Arc::new(LocalCustodianClient::new())).await
    }

    pub(crate) async fn test_state_with_client(
        config: &ServiceConfig,
        client: Arc<dyn CustodianClient>,
    ) -> ServiceState {
        let database = Database::in_memory().await.unwrap();
        ServiceState::from_parts(config, database, client)
    }

    pub(crate) async fn json_body<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}
