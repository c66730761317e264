use algobank_types::Digest;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"algobank-leaf-v1"`) that is
/// prepended to every hash computation. A Merkle leaf and an internal node
/// over identical bytes therefore never collide, which closes the classic
/// second-preimage attack on unbalanced trees.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for Merkle leaves (individual records).
    pub const LEAF: Self = Self {
        domain: "algobank-leaf-v1",
    };
    /// Hasher for Merkle internal nodes.
    pub const NODE: Self = Self {
        domain: "algobank-node-v1",
    };
    /// Hasher for journal entries.
    pub const ENTRY: Self = Self {
        domain: "algobank-entry-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        self.hash_parts(&[data])
    }

    /// Hash the concatenation of several byte slices with domain separation.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(part);
        }
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &Digest) -> bool {
        self.hash(data) == *expected
    }

    /// Raw BLAKE3 hash without domain separation.
    pub fn raw_hash(data: &[u8]) -> Digest {
        Digest::of(data)
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
