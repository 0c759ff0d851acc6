//! Serializable cache entry and the chunk metadata consumed from the bundler.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Chunk metadata supplied by the bundler for one output unit.
///
/// Owned by the bundler, not the cache: `file_name` is the provisional name
/// assigned this build and may change during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// Logical chunk name (entry name or generated split name).
    pub name: String,
    /// Provisional output filename for this build.
    pub file_name: String,
    /// Ids of the modules bundled into this chunk.
    pub module_ids: Vec<String>,
}

impl ChunkDescriptor {
    /// Create a descriptor.
    pub fn new(
        name: impl Into<String>,
        file_name: impl Into<String>,
        module_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            module_ids: module_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// One persisted transform result.
///
/// Created on a cache miss with `output_hash = None`; the hash and canonical
/// filename are filled in once the bundler's naming phase has run for the
/// key, and are treated as canonical for every later build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Content hash of each member module at the time of caching.
    ///
    /// A BTreeMap keeps the persisted document byte-stable across saves.
    pub module_hashes: BTreeMap<String, String>,
    /// The cached transform output.
    pub obfuscated_code: String,
    /// Stable hash embedded in the chunk's public filename, once known.
    pub output_hash: Option<String>,
    /// Canonical output filename.
    pub file_name: String,
    /// Logical chunk name.
    pub chunk_name: String,
    /// When this entry was created.
    pub timestamp: DateTime<Utc>,
}
