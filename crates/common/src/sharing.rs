//! Threshold split and combine of byte secrets
//!
//! Thin wrapper around Shamir sharing over GF(256) from the `sharks` crate.
//! The codec splits `blake3(secret) || secret` rather than the bare secret so
//! that combining shares from different splits, or too few shares, fails
//! loudly instead of yielding garbage.

use std::collections::HashSet;
use std::fmt;

use sharks::{Share as SharkShare, Sharks};

/// Size of the integrity digest prepended to the secret before splitting
pub const DIGEST_SIZE: usize = blake3::OUT_LEN;
/// Largest number of shares a GF(256) split can produce
pub const MAX_SHARES: usize = 255;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ShareCodecError {
    #[error("invalid sharing parameters: {0}")]
    InvalidParameters(String),
    #[error("reconstruction failed: {0}")]
    Reconstruction(String),
}

/// One share of a split secret
///
/// Layout is `x || y`: the first byte is the share's evaluation index, the
/// rest the polynomial evaluations. The whole blob is what gets encrypted to
/// a custodian, so the index travels with it.
#[derive(Clone, PartialEq, Eq)]
pub struct Share(Vec<u8>);

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Share")
            .field("index", &self.index())
            .field("len", &self.0.len())
            .finish()
    }
}

impl Share {
    /// Wrap raw share bytes, as returned by a custodian
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ShareCodecError> {
        if bytes.len() < 2 {
            return Err(ShareCodecError::Reconstruction(format!(
                "share too short: {} bytes",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// The evaluation index (x coordinate) of this share
    pub fn index(&self) -> u8 {
        self.0[0]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

pub struct ShareCodec;

impl ShareCodec {
    /// Split `secret` into `count` shares, any `threshold` of which recover it
    pub fn split(secret: &[u8], threshold: u8, count: usize) -> Result<Vec<Share>, ShareCodecError> {
        if secret.is_empty() {
            return Err(ShareCodecError::InvalidParameters(
                "secret must not be empty".to_string(),
            ));
        }
        if threshold == 0 {
            return Err(ShareCodecError::InvalidParameters(
                "threshold must be at least 1".to_string(),
            ));
        }
        if count < threshold as usize || count > MAX_SHARES {
            return Err(ShareCodecError::InvalidParameters(format!(
                "share count {} must be between threshold {} and {}",
                count, threshold, MAX_SHARES
            )));
        }

        let mut payload = Vec::with_capacity(DIGEST_SIZE + secret.len());
        payload.extend_from_slice(blake3::hash(secret).as_bytes());
        payload.extend_from_slice(secret);

        let shares = Sharks(threshold)
            .dealer(&payload)
            .take(count)
            .map(|share| Share(Vec::from(&share)))
            .collect();
        Ok(shares)
    }

    /// Recombine at least `threshold` shares of one split
    ///
    /// Input order does not matter. Shares repeating an index already seen
    /// are ignored, so a duplicated share does not count towards the
    /// threshold.
    pub fn combine(shares: &[Share], threshold: u8) -> Result<Vec<u8>, ShareCodecError> {
        if threshold == 0 {
            return Err(ShareCodecError::InvalidParameters(
                "threshold must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut parts = Vec::with_capacity(shares.len());
        for share in shares {
            if !seen.insert(share.index()) {
                continue;
            }
            let part = SharkShare::try_from(share.as_bytes())
                .map_err(|e| ShareCodecError::Reconstruction(e.to_string()))?;
            parts.push(part);
        }

        if parts.len() < threshold as usize {
            return Err(ShareCodecError::Reconstruction(format!(
                "need {} distinct shares, got {}",
                threshold,
                parts.len()
            )));
        }

        let payload = Sharks(threshold)
            .recover(parts.iter())
            .map_err(|e| ShareCodecError::Reconstruction(e.to_string()))?;

        if payload.len() <= DIGEST_SIZE {
            return Err(ShareCodecError::Reconstruction(
                "recovered payload too short".to_string(),
            ));
        }
        let (digest, secret) = payload.split_at(DIGEST_SIZE);
        if blake3::hash(secret).as_bytes() != digest {
            return Err(ShareCodecError::Reconstruction(
                "shares are inconsistent".to_string(),
            ));
        }

        Ok(secret.to_vec())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_split_shapes() {
        let shares = ShareCodec::split(b"hello-world", 3, 4).unwrap();
        assert_eq!(shares.len(), 4);

        let indices: HashSet<u8> = shares.iter().map(Share::index).collect();
        assert_eq!(indices.len(), 4);
        for share in &shares {
            assert_eq!(share.as_bytes().len(), 1 + DIGEST_SIZE + b"hello-world".len());
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            ShareCodec::split(b"", 1, 1),
            Err(ShareCodecError::InvalidParameters(_))
        ));
        assert!(matches!(
            ShareCodec::split(b"x", 0, 3),
            Err(ShareCodecError::InvalidParameters(_))
        ));
        assert!(matches!(
            ShareCodec::split(b"x", 4, 3),
            Err(ShareCodecError::InvalidParameters(_))
        ));
        assert!(matches!(
            ShareCodec::split(b"x", 2, 256),
            Err(ShareCodecError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_threshold_of_one() {
        let shares = ShareCodec::split(b"solo", 1, 3).unwrap();
        for share in &shares {
            assert_eq!(
                ShareCodec::combine(std::slice::from_ref(share), 1).unwrap(),
                b"solo"
            );
        }
    }

    #[test]
    fn test_duplicates_do_not_count() {
        let shares = ShareCodec::split(b"dupes", 3, 5).unwrap();
        let padded = vec![shares[0].clone(), shares[0].clone(), shares[1].clone()];
        assert!(matches!(
            ShareCodec::combine(&padded, 3),
            Err(ShareCodecError::Reconstruction(_))
        ));

        let enough = vec![
            shares[0].clone(),
            shares[0].clone(),
            shares[1].clone(),
            shares[4].clone(),
        ];
        assert_eq!(ShareCodec::combine(&enough, 3).unwrap(), b"dupes");
    }

    #[test]
    fn test_mixed_splits_detected() {
        let a = ShareCodec::split(b"first secret", 2, 3).unwrap();
        let b = ShareCodec::split(b"first secret", 2, 3).unwrap();
        // same indices from different polynomials
        let mixed = vec![a[0].clone(), b[1].clone()];
        assert!(matches!(
            ShareCodec::combine(&mixed, 2),
            Err(ShareCodecError::Reconstruction(_))
        ));
    }

    #[test]
    fn test_short_share_rejected() {
        assert!(Share::from_bytes(vec![1]).is_err());
        assert!(Share::from_bytes(vec![1, 2]).is_ok());
    }
}
