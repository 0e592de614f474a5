use super::{AuthError, Identity, SignedMessage};

/// A chain family's signature check
///
/// Each scheme proves that whoever produced `signature` controls the
/// identity the message claims, and returns that identity.
pub trait SignatureScheme: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Whether this scheme handles messages tagged with `chain`
    fn accepts(&self, chain: &str) -> bool;

    fn verify(
        &self,
        raw_message: &str,
        message: &SignedMessage,
        signature: &str,
    ) -> Result<Identity, AuthError>;
}

/// Decode a hex string with or without a `0x` prefix
pub(crate) fn decode_hex(value: &str) -> Option<Vec<u8>> {
    let value = value.trim();
    hex::decode(value.strip_prefix("0x").unwrap_or(value)).ok()
}
