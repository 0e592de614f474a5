use reqwest::StatusCode;

use crate::http_server::api::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    /// The daemon answered with a structured custody error
    #[error("{} ({:?})", .1.message, .1.kind)]
    Custody(StatusCode, ErrorBody),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
}
