use std::time::Duration;

use clap::Args;

use custody_daemon::state::{AppState, StateError};
use custody_daemon::{spawn_service, ProcessError, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),

    #[error("daemon failed: {0}")]
    Failed(#[from] ProcessError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let secret_key = state.load_key()?;

        let config = ServiceConfig {
            node_id: state.config.node_id.clone(),
            node_secret: Some(secret_key),
            api_port: self.api_port.unwrap_or(state.config.api_port),
            sqlite_path: Some(state.db_path.clone()),
            custodians: state.config.custodians.clone(),
            threshold: state.config.threshold,
            kdf: state.config.kdf,
            custodian_timeout: Duration::from_secs(state.config.custodian_timeout_secs),
            nonce_policy: state.config.nonce_policy,
            enforce_custodian_auth: state.config.enforce_custodian_auth,
            log_level: tracing::Level::DEBUG,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await?;
        Ok("daemon ended".to_string())
    }
}
