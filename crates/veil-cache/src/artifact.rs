//! Artifact cache facade.
//!
//! Ties fingerprinting, key derivation, the durable store, and hit/miss
//! accounting into one per-build handle. The facade never invokes the
//! transform itself: callers run it on a miss and hand the output to
//! [`ArtifactCache::record`]. A failed transform must simply not be
//! recorded; the chunk passes through un-cached for that build.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::CacheResult;
use crate::config::CacheConfig;
use crate::entry::{CacheEntry, ChunkDescriptor};
use crate::fingerprint::{DependencyAllowList, FingerprintPolicy, SourceHasher};
use crate::key::derive_chunk_key;
use crate::stats::{CacheStats, StatsCollector};
use crate::store::CacheStore;

/// One build's view of the obfuscation cache.
///
/// The fingerprint map is fresh per handle; the store is loaded from disk
/// on open and persisted once via [`ArtifactCache::persist`].
pub struct ArtifactCache {
    hasher: SourceHasher,
    store: CacheStore,
    stats: StatsCollector,
    force_rebuild: bool,
}

impl ArtifactCache {
    /// Open the cache with the default fingerprint policy built from
    /// `config.tracked_dependencies`.
    pub fn open(config: &CacheConfig) -> Self {
        let policy = DependencyAllowList::new(config.tracked_dependencies.iter().cloned());
        Self::with_policy(config, Box::new(policy))
    }

    /// Open the cache with a custom fingerprint policy.
    pub fn with_policy(config: &CacheConfig, policy: Box<dyn FingerprintPolicy>) -> Self {
        Self {
            hasher: SourceHasher::new(policy),
            store: CacheStore::load(config),
            stats: StatsCollector::new(),
            force_rebuild: config.should_force_rebuild(),
        }
    }

    /// Fingerprint one module's content for this build.
    pub fn track_module(&self, module_id: &str, content: &str) {
        self.hasher.track(module_id, content);
    }

    /// Look up the chunk's entry; counts a hit when one is found.
    ///
    /// Returns `None` on a miss (nothing is counted yet - the caller runs
    /// the transform and calls [`ArtifactCache::record`]) and always misses
    /// under force-rebuild.
    pub fn lookup(&self, chunk: &ChunkDescriptor) -> Option<CacheEntry> {
        if self.force_rebuild {
            return None;
        }
        let key = derive_chunk_key(chunk, &self.hasher);
        let entry = self.store.get(&key)?;
        self.stats.record_hit();
        Some(entry)
    }

    /// Store a fresh transform result for the chunk.
    ///
    /// Snapshots the member modules' fingerprints and creates an entry with
    /// no output hash; the hash arrives later via
    /// [`ArtifactCache::finalize_output_name`].
    pub fn record(&self, chunk: &ChunkDescriptor, obfuscated_code: impl Into<String>) {
        let key = derive_chunk_key(chunk, &self.hasher);

        let mut module_hashes = BTreeMap::new();
        for id in &chunk.module_ids {
            if let Some(fingerprint) = self.hasher.fingerprint(id) {
                module_hashes.insert(id.clone(), fingerprint);
            }
        }

        let entry = CacheEntry {
            module_hashes,
            obfuscated_code: obfuscated_code.into(),
            output_hash: None,
            file_name: chunk.file_name.clone(),
            chunk_name: chunk.name.clone(),
            timestamp: Utc::now(),
        };

        self.store.put(key, entry);
        self.stats.record_obfuscated();
    }

    /// Record the bundler's resolved output hash and filename for the
    /// chunk's entry, if one exists. This is how a brand-new entry learns
    /// its canonical stable name.
    pub fn finalize_output_name(&self, chunk: &ChunkDescriptor, output_hash: &str) {
        let key = derive_chunk_key(chunk, &self.hasher);
        self.store.update(&key, |entry| {
            entry.output_hash = Some(output_hash.to_string());
            entry.file_name = chunk.file_name.clone();
        });
    }

    /// Key-derived read without hit accounting.
    ///
    /// Used by reconciliation, which walks every emitted chunk after the
    /// per-chunk phase already counted hits.
    pub fn entry_for(&self, chunk: &ChunkDescriptor) -> Option<CacheEntry> {
        self.store.get(&derive_chunk_key(chunk, &self.hasher))
    }

    /// This build's hit/miss report.
    pub fn stats(&self) -> CacheStats {
        self.stats.report()
    }

    /// Write the store to disk.
    pub fn persist(&self) -> CacheResult<()> {
        self.store.save()
    }

    /// The underlying store.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}
