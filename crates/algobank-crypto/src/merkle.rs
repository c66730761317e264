use algobank_types::Digest;
use serde::{Deserialize, Serialize};

use crate::hasher::ContentHasher;

/// Hex encoding of the root of an empty record sequence: the BLAKE3 hash of
/// the empty byte string.
pub const EMPTY_ROOT_HEX: &str = "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262";

/// Side of a sibling in a Merkle proof path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Binary Merkle tree over a sequence of opaque byte records.
///
/// Records are hashed with [`ContentHasher::LEAF`]; internal nodes are hashed
/// with [`ContentHasher::NODE`] over the concatenation of their two children.
/// A level with an odd number of nodes pairs its last node with itself.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    root: Digest,
    /// All tree nodes stored level by level. Level 0 = leaf hashes, last
    /// level = root. Empty for an empty tree.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build a tree from raw records.
    ///
    /// An empty sequence produces the hash of the empty byte string as root.
    /// A single record's root is its leaf hash.
    pub fn from_records<R: AsRef<[u8]>>(records: &[R]) -> Self {
        let leaves = records
            .iter()
            .map(|r| ContentHasher::LEAF.hash(r.as_ref()))
            .collect();
        Self::from_leaf_hashes(leaves)
    }

    /// Build a tree from already-hashed leaves.
    pub fn from_leaf_hashes(leaves: Vec<Digest>) -> Self {
        if leaves.is_empty() {
            return Self {
                root: ContentHasher::raw_hash(b""),
                levels: vec![],
            };
        }

        let mut levels: Vec<Vec<Digest>> = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next = current
                .chunks(2)
                .map(|pair| {
                    let left = &pair[0];
                    let right = pair.get(1).unwrap_or(left);
                    hash_pair(left, right)
                })
                .collect();
            levels.push(next);
        }

        let root = levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(|| ContentHasher::raw_hash(b""));
        Self { root, levels }
    }

    /// The root digest of the tree.
    pub fn root(&self) -> Digest {
        self.root
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Hash of the leaf at `index`.
    pub fn leaf(&self, index: usize) -> Option<Digest> {
        self.levels.first().and_then(|l| l.get(index)).copied()
    }

    /// Generate an inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        let leaf = self.leaf(index)?;

        let mut path = Vec::new();
        let mut idx = index;

        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
            // Odd level: the last node is paired with itself.
            let sibling = level.get(sibling_idx).copied().unwrap_or(level[idx]);
            let side = if idx % 2 == 0 {
                Side::Right
            } else {
                Side::Left
            };
            path.push((sibling, side));
            idx /= 2;
        }

        Some(MerkleProof {
            leaf,
            path,
            root: self.root,
        })
    }
}

/// Merkle inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Leaf hash being proven.
    pub leaf: Digest,
    /// Path of (sibling_hash, sibling_side) pairs from leaf to root.
    pub path: Vec<(Digest, Side)>,
    /// Expected root.
    pub root: Digest,
}

impl MerkleProof {
    /// Recompute the root from the leaf and path and compare.
    pub fn verify(&self) -> bool {
        let mut current = self.leaf;
        for (sibling, side) in &self.path {
            current = match side {
                Side::Left => hash_pair(sibling, &current),
                Side::Right => hash_pair(&current, sibling),
            };
        }
        current == self.root
    }

    /// Check that this proof commits `record` (not just its hash).
    pub fn proves_record(&self, record: &[u8]) -> bool {
        ContentHasher::LEAF.hash(record) == self.leaf && self.verify()
    }
}

/// Merkle root of a sequence of byte records.
pub fn merkle_root<R: AsRef<[u8]>>(records: &[R]) -> Digest {
    MerkleTree::from_records(records).root()
}

/// Hex-encoded Merkle root of a sequence of byte records.
pub fn hex_root<R: AsRef<[u8]>>(records: &[R]) -> String {
    merkle_root(records).to_hex()
}

fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    ContentHasher::NODE.hash_parts(&[left.as_bytes(), right.as_bytes()])
}
