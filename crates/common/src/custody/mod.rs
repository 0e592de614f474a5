//! Distribution and recovery of custodied secrets
//!
//! # Distribution
//!
//! 1. Refuse keys that already hold a record
//! 2. Fetch the custodian list from the registry
//! 3. Split the secret into one share per custodian
//! 4. Encrypt share `i` to custodian `i` and attach the ACL
//! 5. Store the record with a unique-create
//!
//! # Recovery
//!
//! 1. Load the record
//! 2. Authenticate and authorize the caller
//! 3. Pick `threshold` shares at random
//! 4. Have each selected custodian decrypt its share, concurrently
//! 5. Combine

mod custodian;
mod distribute;
mod error;
mod record;
mod recover;

pub use custodian::{
    custodian_endpoint, CustodianClient, CustodianError, CustodianNode, DecryptRequest,
    DecryptResponse,
};
pub use distribute::{DistributionOrchestrator, DEFAULT_THRESHOLD};
pub use error::{CustodyError, ErrorKind};
pub use record::{EncryptedShare, SecretRecord};
pub use recover::{RecoveryOrchestrator, DEFAULT_CUSTODIAN_TIMEOUT};
