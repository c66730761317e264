//! Hashing primitives for AlgoBank.
//!
//! Provides domain-separated BLAKE3 hashing, binary Merkle trees over opaque
//! byte records (with inclusion proofs), and hash chain verification for the
//! append-only journal.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod chain;
pub mod hasher;
pub mod merkle;

pub use chain::{ChainError, HasEntryHash, HashChainVerifier};
pub use hasher::ContentHasher;
pub use merkle::{hex_root, merkle_root, MerkleProof, MerkleTree, Side, EMPTY_ROOT_HEX};
