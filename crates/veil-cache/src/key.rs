//! Chunk cache-key derivation using BLAKE3 content-addressed hashing.
//!
//! A chunk's key is a pure function of its member module ids and their
//! fingerprints at lookup time - never of transform output or filenames.

use serde::{Deserialize, Serialize};

use crate::entry::ChunkDescriptor;
use crate::fingerprint::SourceHasher;

/// Sentinel fingerprint for modules with no tracked hash.
///
/// Keeping untracked modules in the composite (rather than dropping them)
/// means two otherwise-identical chunks that differ in which modules lack
/// fingerprints derive different keys, trading hit rate for correctness.
pub const MISSING_FINGERPRINT: &str = "unknown";

/// Content-addressed cache key (BLAKE3 hex digest).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkKey(String);

impl ChunkKey {
    /// Create a chunk key from a hex string.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Get the chunk key as a hex string.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the cache key for a chunk from its members' current fingerprints.
///
/// Module ids are sorted lexicographically first, so the key is independent
/// of the order the bundler supplies them in. Each id contributes an
/// `id:fingerprint` pair; the pairs are joined with `|` and the composite
/// is hashed to a fixed-length digest.
pub fn derive_chunk_key(chunk: &ChunkDescriptor, hasher: &SourceHasher) -> ChunkKey {
    let mut ids: Vec<&str> = chunk.module_ids.iter().map(String::as_str).collect();
    ids.sort_unstable();

    let composite = ids
        .iter()
        .map(|id| {
            let fingerprint = hasher
                .fingerprint(id)
                .unwrap_or_else(|| MISSING_FINGERPRINT.to_string());
            format!("{id}:{fingerprint}")
        })
        .collect::<Vec<_>>()
        .join("|");

    ChunkKey(blake3::hash(composite.as_bytes()).to_hex().to_string())
}
