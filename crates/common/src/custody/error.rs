use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::crypto::CipherError;
use crate::quorum::QuorumError;
use crate::registry::RegistryError;
use crate::session::SessionError;
use crate::sharing::ShareCodecError;
use crate::store::StoreError;

/// Stable, client-facing classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    AlreadyExists,
    NotFound,
    AuthenticationFailure,
    ExpiredRequest,
    ReplayRejected,
    Unauthorized,
    ReconstructionError,
    DecryptionError,
    CustodianUnavailable,
    NotConfigured,
    Internal,
}

/// Errors surfaced by distribution, recovery and custodian decryption
///
/// Messages carry keys and reasons only, never secret or share bytes.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("a secret is already stored under '{0}'")]
    AlreadyExists(String),
    #[error("no secret stored under '{0}'")]
    NotFound(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("request expired")]
    Expired,
    #[error("nonce rejected")]
    Replay,
    #[error("identity is not authorized for this secret")]
    Unauthorized,
    #[error("reconstruction failed: {0}")]
    Reconstruction(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("custodian unavailable: {0}")]
    CustodianUnavailable(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl CustodyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CustodyError::InvalidInput(_) => ErrorKind::InvalidInput,
            CustodyError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            CustodyError::NotFound(_) => ErrorKind::NotFound,
            CustodyError::Authentication(_) => ErrorKind::AuthenticationFailure,
            CustodyError::Expired => ErrorKind::ExpiredRequest,
            CustodyError::Replay => ErrorKind::ReplayRejected,
            CustodyError::Unauthorized => ErrorKind::Unauthorized,
            CustodyError::Reconstruction(_) => ErrorKind::ReconstructionError,
            CustodyError::Decryption(_) => ErrorKind::DecryptionError,
            CustodyError::CustodianUnavailable(_) => ErrorKind::CustodianUnavailable,
            CustodyError::NotConfigured(_) => ErrorKind::NotConfigured,
            CustodyError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Rebuild an error reported by a remote node
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::InvalidInput => CustodyError::InvalidInput(message),
            ErrorKind::AlreadyExists => CustodyError::AlreadyExists(message),
            ErrorKind::NotFound => CustodyError::NotFound(message),
            ErrorKind::AuthenticationFailure => CustodyError::Authentication(message),
            ErrorKind::ExpiredRequest => CustodyError::Expired,
            ErrorKind::ReplayRejected => CustodyError::Replay,
            ErrorKind::Unauthorized => CustodyError::Unauthorized,
            ErrorKind::ReconstructionError => CustodyError::Reconstruction(message),
            ErrorKind::DecryptionError => CustodyError::Decryption(message),
            ErrorKind::CustodianUnavailable => CustodyError::CustodianUnavailable(message),
            ErrorKind::NotConfigured => CustodyError::NotConfigured(message),
            ErrorKind::Internal => CustodyError::Internal(message),
        }
    }
}

impl From<AuthError> for CustodyError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Malformed(m) => CustodyError::InvalidInput(m),
            AuthError::Authentication(m) => CustodyError::Authentication(m),
            AuthError::Expired => CustodyError::Expired,
            AuthError::Replay => CustodyError::Replay,
            AuthError::Unauthorized => CustodyError::Unauthorized,
            AuthError::Session(m) => CustodyError::Internal(m),
        }
    }
}

impl From<ShareCodecError> for CustodyError {
    fn from(e: ShareCodecError) -> Self {
        match e {
            ShareCodecError::InvalidParameters(m) => CustodyError::InvalidInput(m),
            ShareCodecError::Reconstruction(m) => CustodyError::Reconstruction(m),
        }
    }
}

impl From<CipherError> for CustodyError {
    fn from(e: CipherError) -> Self {
        CustodyError::Decryption(e.to_string())
    }
}

impl From<RegistryError> for CustodyError {
    fn from(e: RegistryError) -> Self {
        CustodyError::Internal(e.to_string())
    }
}

impl From<SessionError> for CustodyError {
    fn from(e: SessionError) -> Self {
        CustodyError::Internal(e.to_string())
    }
}

impl From<QuorumError> for CustodyError {
    fn from(e: QuorumError) -> Self {
        CustodyError::CustodianUnavailable(e.to_string())
    }
}

impl<T: std::fmt::Display> From<StoreError<T>> for CustodyError {
    fn from(e: StoreError<T>) -> Self {
        match e {
            StoreError::AlreadyExists(key) => CustodyError::AlreadyExists(key),
            StoreError::NotFound(key) => CustodyError::NotFound(key),
            StoreError::Provider(e) => CustodyError::Internal(e.to_string()),
        }
    }
}
