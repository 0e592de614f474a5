use std::sync::Arc;

use url::Url;

use common::custody::{CustodianClient, CustodianNode};
use common::prelude::{
    AuthVerifier, DistributionOrchestrator, PublicKey, RecoveryOrchestrator,
    SessionNonceManager, StaticRegistry,
};

use crate::custodian_client::HttpCustodianClient;
use crate::database::{Database, DatabaseSetupError};
use crate::service_config::Config;

/// Main service state - everything a request handler needs
#[derive(Debug, Clone)]
pub struct State {
    node_id: String,
    database: Database,
    sessions: SessionNonceManager<Database>,
    distributor: DistributionOrchestrator<Database>,
    recoverer: RecoveryOrchestrator<Database>,
    custodian: CustodianNode,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                if !path.exists() {
                    return Err(StateSetupError::DatabasePathDoesNotExist);
                }
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup custodian transport
        let client = HttpCustodianClient::new(config.custodian_timeout)
            .map_err(|e| StateSetupError::CustodianClient(e.to_string()))?;

        Ok(Self::from_parts(config, database, Arc::new(client)))
    }

    /// Assemble state over an already connected database and transport
    pub fn from_parts(
        config: &Config,
        database: Database,
        client: Arc<dyn CustodianClient>,
    ) -> Self {
        let sessions =
            SessionNonceManager::with_policy(database.clone(), config.nonce_policy.policy());

        let registry = Arc::new(StaticRegistry::new(config.custodians.clone()));
        let distributor = DistributionOrchestrator::new(database.clone(), registry)
            .with_threshold(config.threshold)
            .with_kdf(config.kdf);

        let verifier = AuthVerifier::new().with_replay_guard(Arc::new(sessions.clone()));
        let recoverer = RecoveryOrchestrator::new(database.clone(), verifier, client)
            .with_timeout(config.custodian_timeout);

        let mut custodian = CustodianNode::new(config.node_secret.clone());
        if config.enforce_custodian_auth {
            // nonces belong to the orchestrating node; custodians check the rest
            custodian = custodian.with_gate(AuthVerifier::new());
        }

        match custodian.public_key() {
            Some(key) => tracing::info!(node_id = %config.node_id, public_key = %key, "custodian key loaded"),
            None => tracing::warn!(node_id = %config.node_id, "no custodian key, decrypt requests will be refused"),
        }
        tracing::info!(
            custodians = config.custodians.len(),
            threshold = config.threshold,
            "custody registry configured"
        );

        Self {
            node_id: config.node_id.clone(),
            database,
            sessions,
            distributor,
            recoverer,
            custodian,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        self.custodian.public_key()
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn sessions(&self) -> &SessionNonceManager<Database> {
        &self.sessions
    }

    pub fn distributor(&self) -> &DistributionOrchestrator<Database> {
        &self.distributor
    }

    pub fn recoverer(&self) -> &RecoveryOrchestrator<Database> {
        &self.recoverer
    }

    pub fn custodian(&self) -> &CustodianNode {
        &self.custodian
    }
}

impl AsRef<Database> for State {
    fn as_ref(&self) -> &Database {
        self.database()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,
    #[error("Database setup error: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
    #[error("Custodian client error: {0}")]
    CustodianClient(String),
}
