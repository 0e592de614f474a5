use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::prelude::{CustodyError, ErrorKind};

/// Body of every error response
///
/// ```text
/// { "kind": "Unauthorized", "message": "identity is not authorized for this secret" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// A custody failure on its way out of a handler
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct CustodyApiError(#[from] pub CustodyError);

impl CustodyApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AuthenticationFailure
            | ErrorKind::ExpiredRequest
            | ErrorKind::ReplayRejected => StatusCode::UNAUTHORIZED,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::DecryptionError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::CustodianUnavailable => StatusCode::BAD_GATEWAY,
            ErrorKind::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::ReconstructionError | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for CustodyApiError {
    fn from(rejection: JsonRejection) -> Self {
        CustodyApiError(CustodyError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for CustodyApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = ?self.0.kind(), "request failed: {}", self.0);
        } else {
            tracing::warn!(kind = ?self.0.kind(), "request rejected: {}", self.0);
        }

        let body = ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
