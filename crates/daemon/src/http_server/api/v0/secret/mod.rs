use axum::routing::post;
use axum::Router;

pub mod get;
pub mod set;

pub use get::{GetRequest, GetResponse};
pub use set::{SetRequest, SetResponse};

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", post(set::handler))
        .route("/get", post(get::handler))
        .with_state(state)
}
