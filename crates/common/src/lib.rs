/**
 * Authentication of recovery callers.
 *  - Identities and access lists
 *  - Chain signature schemes (EVM, state-init)
 *  - Freshness, replay and ACL gates
 */
pub mod auth;
/**
 * Cryptographic types and operations.
 *  - Public and Private key implementations
 *  - Per-custodian hybrid share encryption
 */
pub mod crypto;
/**
 * Distribution and recovery flows, the custodian
 *  decrypt handler, and the errors they surface.
 */
pub mod custody;
/**
 * Uniform random quorum selection.
 */
pub mod quorum;
/**
 * Source of the current custodian set.
 */
pub mod registry;
/**
 * Replay-protection nonces per identity.
 */
pub mod session;
/**
 * Threshold split/combine of byte secrets.
 */
pub mod sharing;
/**
 * Storage traits for records and sessions,
 *  plus in-memory implementations.
 */
pub mod store;
/**
 * In-process custodians and signing wallets
 *  for tests.
 */
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::auth::{Acl, AuthVerifier, Identity, RecoveryRequest};
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::custody::{
        CustodyError, DistributionOrchestrator, ErrorKind, RecoveryOrchestrator, SecretRecord,
    };
    pub use crate::registry::{Custodian, NodeRegistry, StaticRegistry};
    pub use crate::session::SessionNonceManager;
    pub use crate::version::build_info;
}
