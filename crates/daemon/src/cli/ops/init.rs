use clap::Args;

use common::crypto::Kdf;
use common::session::NoncePolicyKind;
use custody_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server port
    #[arg(long, default_value_t = 5001)]
    pub api_port: u16,

    /// Name this node reports on its identity endpoint
    #[arg(long, default_value = "localhost")]
    pub node_id: String,

    /// Shares required to recover a secret
    #[arg(long, default_value_t = common::custody::DEFAULT_THRESHOLD)]
    pub threshold: u8,

    /// Nonce policy: latest or single_use
    #[arg(long, default_value = "latest")]
    pub nonce_policy: NoncePolicyKind,

    /// Key derivation for new shares: legacy or blake3
    #[arg(long, default_value = "legacy")]
    pub kdf: Kdf,

    /// Require caller authorization on custodian decrypt calls
    #[arg(long)]
    pub enforce_custodian_auth: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            node_id: self.node_id.clone(),
            threshold: self.threshold,
            nonce_policy: self.nonce_policy,
            kdf: self.kdf,
            enforce_custodian_auth: self.enforce_custodian_auth,
            ..Default::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let public_key = state.load_key()?.public();

        let output = format!(
            "Initialized custody directory at: {}\n\
             - Database: {}\n\
             - Key: {}\n\
             - Config: {}\n\
             - Public key: {}\n\
             - API port: {}\n\
             - Threshold: {}\n\
             Add custodians to the config before distributing secrets.",
            state.custody_dir.display(),
            state.db_path.display(),
            state.key_path.display(),
            state.config_path.display(),
            public_key,
            state.config.api_port,
            state.config.threshold,
        );

        Ok(output)
    }
}
