//! EVM personal-message signatures (EIP-191)
//!
//! The signer is recovered from a 65-byte `r || s || v` secp256k1
//! signature over `"\x19Ethereum Signed Message:\n" || len || message` and
//! compared with the claimed address.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};

use super::scheme::{decode_hex, SignatureScheme};
use super::{AuthError, Identity, SignedMessage};

const SIGNATURE_SIZE: usize = 65;

/// Keccak-256 of the EIP-191 personal-message envelope
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Lowercase `0x`-prefixed address of a secp256k1 public key
pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Recover the signer address of an EIP-191 signature
pub fn recover_address(message: &[u8], signature: &[u8]) -> Result<String, AuthError> {
    if signature.len() != SIGNATURE_SIZE {
        return Err(AuthError::Authentication(format!(
            "expected {} byte signature, got {}",
            SIGNATURE_SIZE,
            signature.len()
        )));
    }

    let v = match signature[64] {
        27 | 28 => signature[64] - 27,
        0 | 1 => signature[64],
        other => {
            return Err(AuthError::Authentication(format!(
                "invalid recovery byte {}",
                other
            )))
        }
    };
    let mut recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| AuthError::Authentication("invalid recovery id".to_string()))?;

    let mut signature = Signature::from_slice(&signature[..64])
        .map_err(|_| AuthError::Authentication("invalid signature encoding".to_string()))?;
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let key = VerifyingKey::recover_from_prehash(&eip191_hash(message), &signature, recovery_id)
        .map_err(|_| AuthError::Authentication("signer recovery failed".to_string()))?;
    Ok(address_of(&key))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EvmScheme;

impl SignatureScheme for EvmScheme {
    fn name(&self) -> &'static str {
        "evm"
    }

    fn accepts(&self, chain: &str) -> bool {
        matches!(
            chain.to_ascii_lowercase().as_str(),
            "evm" | "eth" | "ethereum"
        )
    }

    fn verify(
        &self,
        raw_message: &str,
        message: &SignedMessage,
        signature: &str,
    ) -> Result<Identity, AuthError> {
        let claimed = message
            .address
            .as_deref()
            .map(Identity::new)
            .filter(|identity| !identity.is_empty())
            .ok_or_else(|| AuthError::Malformed("evm message has no address".to_string()))?;
        let signature = decode_hex(signature)
            .ok_or_else(|| AuthError::Authentication("signature is not hex".to_string()))?;

        let recovered = Identity::new(&recover_address(raw_message.as_bytes(), &signature)?);
        if recovered != claimed {
            return Err(AuthError::Authentication(
                "signer does not match claimed address".to_string(),
            ));
        }
        Ok(claimed)
    }
}
