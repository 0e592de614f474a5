use std::path::PathBuf;
use std::time::Duration;

use common::crypto::Kdf;
use common::prelude::{Custodian, SecretKey};
use common::session::NoncePolicyKind;

#[derive(Debug, Clone)]
pub struct Config {
    // node configuration
    /// name reported on the identity endpoint
    pub node_id: String,
    /// the node's custodian key,
    ///  if not set then decrypt requests are refused
    pub node_secret: Option<SecretKey>,

    // http server configuration
    /// Port for the API HTTP server
    pub api_port: u16,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // custody configuration
    /// registry of custodians new secrets are distributed to
    pub custodians: Vec<Custodian>,
    /// shares required to recover a newly distributed secret
    pub threshold: u8,
    /// key derivation for newly encrypted shares
    pub kdf: Kdf,
    /// bound on each custodian decrypt call
    pub custodian_timeout: Duration,
    pub nonce_policy: NoncePolicyKind,
    /// verify the caller's authorization before decrypting a share
    pub enforce_custodian_auth: bool,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: "localhost".to_string(),
            node_secret: None,
            api_port: 5001,
            sqlite_path: None,
            custodians: Vec::new(),
            threshold: common::custody::DEFAULT_THRESHOLD,
            kdf: Kdf::default(),
            custodian_timeout: common::custody::DEFAULT_CUSTODIAN_TIMEOUT,
            nonce_policy: NoncePolicyKind::default(),
            enforce_custodian_auth: false,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
