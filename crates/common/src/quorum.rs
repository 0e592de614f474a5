//! Uniform quorum selection
//!
//! Recovery decrypts exactly `threshold` shares, chosen uniformly at random
//! without replacement and independently on every call, so no fixed subset
//! of custodians sees every recovery.

use rand::seq::index;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("cannot select {requested} of {available} candidates")]
pub struct QuorumError {
    pub requested: usize,
    pub available: usize,
}

/// Pick `amount` distinct positions out of `0..len`
pub fn sample_indices(len: usize, amount: usize) -> Result<Vec<usize>, QuorumError> {
    sample_indices_with(&mut rand::rng(), len, amount)
}

/// As [`sample_indices`], drawing from the given rng
pub fn sample_indices_with<R>(rng: &mut R, len: usize, amount: usize) -> Result<Vec<usize>, QuorumError>
where
    R: rand::Rng + ?Sized,
{
    if amount > len {
        return Err(QuorumError {
            requested: amount,
            available: len,
        });
    }
    Ok(index::sample(rng, len, amount).into_vec())
}

/// Pick `amount` distinct items out of `items`, preserving nothing about their order
pub fn select<T: Clone>(items: &[T], amount: usize) -> Result<Vec<T>, QuorumError> {
    Ok(sample_indices(items.len(), amount)?
        .into_iter()
        .map(|i| items[i].clone())
        .collect())
}
