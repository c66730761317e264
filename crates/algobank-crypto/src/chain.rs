use algobank_types::Digest;

use crate::hasher::ContentHasher;

/// Trait for records that participate in a hash chain.
pub trait HasEntryHash {
    /// The record's own hash.
    fn entry_hash(&self) -> Digest;
    /// The previous record's hash (None for the first record).
    fn prev_hash(&self) -> Option<Digest>;
    /// Canonical payload bytes for hash verification.
    fn payload_bytes(&self) -> Vec<u8>;
}

/// Hash chain integrity verifier.
///
/// Verifies that a sequence of records forms a valid hash chain: each
/// record's `prev_hash` matches the previous record's `entry_hash`, and each
/// record's hash is correctly computed from its payload.
pub struct HashChainVerifier;

impl HashChainVerifier {
    /// Verify a chain of records.
    ///
    /// Checks:
    /// 1. First record has no previous hash
    /// 2. Each subsequent record's prev_hash matches the previous entry_hash
    /// 3. Each record's hash is correct for its payload
    pub fn verify_chain(records: &[impl HasEntryHash]) -> Result<(), ChainError> {
        let Some(first) = records.first() else {
            return Ok(());
        };

        if first.prev_hash().is_some() {
            return Err(ChainError::GenesisHasPrevHash);
        }
        if Self::compute_hash(&first.payload_bytes(), None) != first.entry_hash() {
            return Err(ChainError::HashMismatch { index: 0 });
        }

        for (i, pair) in records.windows(2).enumerate() {
            let index = i + 1;
            let expected_prev = pair[0].entry_hash();
            match pair[1].prev_hash() {
                Some(prev) if prev == expected_prev => {}
                Some(_) => return Err(ChainError::BrokenLink { index }),
                None => return Err(ChainError::MissingPrevHash { index }),
            }

            let computed = Self::compute_hash(&pair[1].payload_bytes(), Some(expected_prev));
            if computed != pair[1].entry_hash() {
                return Err(ChainError::HashMismatch { index });
            }
        }

        Ok(())
    }

    /// Compute the expected hash for a payload and optional previous hash.
    pub fn compute_hash(payload: &[u8], prev_hash: Option<Digest>) -> Digest {
        match prev_hash {
            Some(prev) => ContentHasher::ENTRY.hash_parts(&[prev.as_bytes(), payload]),
            None => ContentHasher::ENTRY.hash(payload),
        }
    }
}

/// Errors from chain verification.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first entry has a previous hash (should be None)")]
    GenesisHasPrevHash,

    #[error("broken link at index {index}: prev_hash does not match")]
    BrokenLink { index: usize },

    #[error("missing prev_hash at index {index} (should reference previous entry)")]
    MissingPrevHash { index: usize },

    #[error("hash mismatch at index {index}: computed hash differs from stored")]
    HashMismatch { index: usize },
}

impl ChainError {
    /// Position of the offending record, if the error is tied to one.
    pub fn index(&self) -> usize {
        match self {
            Self::GenesisHasPrevHash => 0,
            Self::BrokenLink { index }
            | Self::MissingPrevHash { index }
            | Self::HashMismatch { index } => *index,
        }
    }
}
