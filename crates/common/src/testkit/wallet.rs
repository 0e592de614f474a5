use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use k256::ecdsa::SigningKey;

use crate::auth::{address_of, contract_address, eip191_hash, Identity, RecoveryRequest, SignedMessage};
use crate::crypto::SecretKey;

/// An EVM account able to sign personal messages
#[derive(Clone)]
pub struct TestWallet {
    key: SigningKey,
}

impl std::fmt::Debug for TestWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TestWallet({})", self.address())
    }
}

impl TestWallet {
    pub fn generate() -> Self {
        loop {
            let mut bytes = [0u8; 32];
            getrandom::getrandom(&mut bytes).expect("failed to generate random bytes");
            // out-of-range scalars are vanishingly rare; draw again
            if let Ok(key) = SigningKey::from_slice(&bytes) {
                return Self { key };
            }
        }
    }

    pub fn address(&self) -> String {
        address_of(self.key.verifying_key())
    }

    pub fn identity(&self) -> Identity {
        Identity::new(&self.address())
    }

    /// EIP-191 signature as `0x`-prefixed hex of `r || s || v`
    pub fn sign(&self, message: &str) -> String {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&eip191_hash(message.as_bytes()))
            .expect("signing a 32 byte prehash");
        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        format!("0x{}", hex::encode(bytes))
    }

    pub fn message(&self, nonce: &str, timestamp_ms: i64) -> String {
        SignedMessage {
            nonce: nonce.to_string(),
            timestamp: timestamp_ms,
            address: Some(self.address()),
            rawaddress: None,
            chain: "evm".to_string(),
            state_init: None,
            public_key: None,
        }
        .to_json()
    }

    /// A message and its signature, as `(message, signature)`
    pub fn sign_message(&self, nonce: &str, timestamp_ms: i64) -> (String, String) {
        let message = self.message(nonce, timestamp_ms);
        let signature = self.sign(&message);
        (message, signature)
    }

    /// A recovery request for `key` signed now
    pub fn recovery_request(&self, key: &str, nonce: &str) -> RecoveryRequest {
        let (message, signature) = self.sign_message(nonce, Utc::now().timestamp_millis());
        RecoveryRequest {
            key: key.to_string(),
            signature,
            message,
        }
    }
}

/// A state-init wallet: an Ed25519 key embedded in a contract payload
#[derive(Debug, Clone)]
pub struct TonWallet {
    key: SecretKey,
    workchain: i32,
}

impl TonWallet {
    pub fn generate() -> Self {
        Self {
            key: SecretKey::generate(),
            workchain: 0,
        }
    }

    pub fn state_init(&self) -> Vec<u8> {
        let mut state_init = b"test-wallet-code".to_vec();
        state_init.extend_from_slice(&self.key.public().to_bytes());
        state_init
    }

    pub fn raw_address(&self) -> String {
        contract_address(self.workchain, &self.state_init())
    }

    pub fn identity(&self) -> Identity {
        Identity::new(&self.raw_address())
    }

    pub fn sign_message(&self, nonce: &str, timestamp_ms: i64) -> (String, String) {
        let message = SignedMessage {
            nonce: nonce.to_string(),
            timestamp: timestamp_ms,
            address: None,
            rawaddress: Some(self.raw_address()),
            chain: "ton".to_string(),
            state_init: Some(STANDARD.encode(self.state_init())),
            public_key: Some(self.key.public().to_hex()),
        }
        .to_json();
        let signature = STANDARD.encode(self.key.sign(message.as_bytes()).to_bytes());
        (message, signature)
    }

    pub fn recovery_request(&self, key: &str, nonce: &str) -> RecoveryRequest {
        let (message, signature) = self.sign_message(nonce, Utc::now().timestamp_millis());
        RecoveryRequest {
            key: key.to_string(),
            signature,
            message,
        }
    }
}
