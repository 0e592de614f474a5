//! State-init chain signatures
//!
//! The caller proves control of a contract address by presenting the
//! contract's state-init payload and the Ed25519 key embedded in it. The
//! address is recomputed from the payload, so the key cannot be swapped for
//! one that does not belong to the claimed contract.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::scheme::{decode_hex, SignatureScheme};
use super::{AuthError, Identity, SignedMessage};
use crate::crypto::PublicKey;

/// `"{workchain}:{hex(sha256(state_init))}"`
pub fn contract_address(workchain: i32, state_init: &[u8]) -> String {
    format!("{}:{}", workchain, hex::encode(Sha256::digest(state_init)))
}

fn parse_raw_address(raw: &str) -> Result<(i32, String), AuthError> {
    let (workchain, hash) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| AuthError::Malformed(format!("invalid raw address '{}'", raw)))?;
    let workchain = workchain
        .parse::<i32>()
        .map_err(|_| AuthError::Malformed(format!("invalid workchain in '{}'", raw)))?;
    Ok((workchain, hash.to_lowercase()))
}

fn decode_signature(signature: &str) -> Option<ed25519_dalek::Signature> {
    let bytes = decode_hex(signature).or_else(|| STANDARD.decode(signature.trim()).ok())?;
    let bytes: [u8; 64] = bytes.try_into().ok()?;
    Some(ed25519_dalek::Signature::from_bytes(&bytes))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StateInitScheme;

impl SignatureScheme for StateInitScheme {
    fn name(&self) -> &'static str {
        "ton"
    }

    fn accepts(&self, chain: &str) -> bool {
        chain.eq_ignore_ascii_case("ton")
    }

    fn verify(
        &self,
        raw_message: &str,
        message: &SignedMessage,
        signature: &str,
    ) -> Result<Identity, AuthError> {
        let raw_address = message
            .rawaddress
            .as_deref()
            .ok_or_else(|| AuthError::Malformed("message has no rawaddress".to_string()))?;
        let state_init = message
            .state_init
            .as_deref()
            .ok_or_else(|| AuthError::Malformed("message has no stateInit".to_string()))?;
        let public_key = message
            .public_key
            .as_deref()
            .ok_or_else(|| AuthError::Malformed("message has no publicKey".to_string()))?;

        let state_init = STANDARD
            .decode(state_init.trim())
            .map_err(|_| AuthError::Malformed("stateInit is not base64".to_string()))?;
        let public_key = PublicKey::from_hex(public_key)
            .map_err(|_| AuthError::Authentication("invalid public key".to_string()))?;

        let (workchain, _) = parse_raw_address(raw_address)?;
        let expected = Identity::new(&contract_address(workchain, &state_init));
        if expected != Identity::new(raw_address) {
            return Err(AuthError::Authentication(
                "state init does not match claimed address".to_string(),
            ));
        }

        let embedded = public_key.to_bytes();
        if !state_init.windows(embedded.len()).any(|w| w == embedded) {
            return Err(AuthError::Authentication(
                "public key is not part of the state init".to_string(),
            ));
        }

        let signature = decode_signature(signature)
            .ok_or_else(|| AuthError::Authentication("invalid signature encoding".to_string()))?;
        public_key
            .verify(raw_message.as_bytes(), &signature)
            .map_err(|_| AuthError::Authentication("signature check failed".to_string()))?;

        Ok(expected)
    }
}
