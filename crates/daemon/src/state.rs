use std::{fs, path::PathBuf};

use common::crypto::Kdf;
use common::prelude::{Custodian, SecretKey};
use common::session::NoncePolicyKind;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "custody";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const KEY_FILE_NAME: &str = "key.pem";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Name this node reports on the identity endpoint
    #[serde(default = "default_node_id")]
    pub node_id: String,
    /// Shares required to recover a secret distributed by this node
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// Bound on each custodian decrypt call, in seconds
    #[serde(default = "default_custodian_timeout_secs")]
    pub custodian_timeout_secs: u64,
    #[serde(default)]
    pub nonce_policy: NoncePolicyKind,
    /// Key derivation for newly distributed shares
    #[serde(default)]
    pub kdf: Kdf,
    /// Require a caller authorization on custodian decrypt calls
    #[serde(default)]
    pub enforce_custodian_auth: bool,
    /// Custodian registry, in assignment order
    #[serde(default)]
    pub custodians: Vec<Custodian>,
}

fn default_api_port() -> u16 {
    5001
}

fn default_node_id() -> String {
    "localhost".to_string()
}

fn default_threshold() -> u8 {
    common::custody::DEFAULT_THRESHOLD
}

fn default_custodian_timeout_secs() -> u64 {
    common::custody::DEFAULT_CUSTODIAN_TIMEOUT.as_secs()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            node_id: default_node_id(),
            threshold: default_threshold(),
            custodian_timeout_secs: default_custodian_timeout_secs(),
            nonce_policy: NoncePolicyKind::default(),
            kdf: Kdf::default(),
            enforce_custodian_auth: false,
            custodians: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the custody directory (~/.custody)
    pub custody_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the node key PEM file
    pub key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the custody directory path (custom or default ~/.custody)
    pub fn custody_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new custody state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let custody_dir = Self::custody_dir(custom_path)?;

        if custody_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&custody_dir)?;

        // Generate and save the node key
        let key = SecretKey::generate();
        let key_path = custody_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = custody_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        // Empty database; migrations run when the service connects
        let db_path = custody_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            custody_dir,
            db_path,
            key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the custody directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let custody_dir = Self::custody_dir(custom_path)?;

        if !custody_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = custody_dir.join(DB_FILE_NAME);
        let key_path = custody_dir.join(KEY_FILE_NAME);
        let config_path = custody_dir.join(CONFIG_FILE_NAME);

        if !db_path.exists() {
            return Err(StateError::MissingFile(DB_FILE_NAME.to_string()));
        }
        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        if config.threshold == 0 {
            return Err(StateError::InvalidConfig(
                "threshold must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            custody_dir,
            db_path,
            key_path,
            config_path,
            config,
        })
    }

    /// Load the node key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("custody directory not initialized. Run 'custody init' first")]
    NotInitialized,

    #[error("custody directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
