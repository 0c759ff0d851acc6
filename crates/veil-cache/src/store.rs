//! Persisted chunk store.
//!
//! A single JSON document maps chunk keys to cache entries. The store is
//! loaded once at build start, mutated in memory, and written back once at
//! build end with a temp-file + rename so a crash mid-write can never
//! corrupt the file the next build reads.
//!
//! The store grows monotonically: a module rename or content edit leaves
//! the old key's entry orphaned but present. Clearing is an explicit
//! operation, never implicit eviction.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::CacheResult;
use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::key::ChunkKey;

/// Error types for store operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Persisted document shape: `{ "chunks": { "<key>": { ... } } }`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    chunks: BTreeMap<ChunkKey, CacheEntry>,
}

/// Durable mapping from chunk key to cache entry.
///
/// In-memory state sits behind a lock so independent chunks can be recorded
/// from parallel workers; a race on the same key is last-write-wins, which
/// is sound because racing writers derived that key from identical content.
pub struct CacheStore {
    path: PathBuf,
    data: RwLock<StoreDocument>,
}

impl CacheStore {
    /// Load the persisted store.
    ///
    /// A missing file is a cold start and a malformed file is a non-fatal
    /// warning; both yield an empty store with first-build semantics.
    pub fn load(config: &CacheConfig) -> Self {
        let path = config.store_path();
        let data = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<StoreDocument>(&raw) {
                Ok(doc) => {
                    tracing::info!(chunks = doc.chunks.len(), "loaded obfuscation cache");
                    doc
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        %err,
                        "failed to parse obfuscation cache, treating as first build"
                    );
                    StoreDocument::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no obfuscation cache on disk");
                StoreDocument::default()
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    %err,
                    "failed to read obfuscation cache, treating as first build"
                );
                StoreDocument::default()
            }
        };

        Self {
            path,
            data: RwLock::new(data),
        }
    }

    /// Get a cached entry by key.
    pub fn get(&self, key: &ChunkKey) -> Option<CacheEntry> {
        self.data.read().chunks.get(key).cloned()
    }

    /// Insert or overwrite an entry.
    pub fn put(&self, key: ChunkKey, entry: CacheEntry) {
        self.data.write().chunks.insert(key, entry);
    }

    /// Mutate an existing entry in place. Returns false if the key is absent.
    pub fn update<F>(&self, key: &ChunkKey, f: F) -> bool
    where
        F: FnOnce(&mut CacheEntry),
    {
        match self.data.write().chunks.get_mut(key) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        }
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.data.read().chunks.contains_key(key)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.data.read().chunks.len()
    }

    /// True if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.read().chunks.is_empty()
    }

    /// Snapshot of all entries, keyed order.
    pub fn entries(&self) -> Vec<(ChunkKey, CacheEntry)> {
        self.data
            .read()
            .chunks
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Write the full store to disk atomically.
    ///
    /// Serializes the document, writes it to a sibling temp file, then
    /// renames into place. Creates the cache directory if needed.
    pub fn save(&self) -> CacheResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (json, chunks) = {
            let data = self.data.read();
            let json = serde_json::to_string_pretty(&*data)
                .map_err(|e| CacheError::Serialization(e.to_string()))?;
            (json, data.chunks.len())
        };

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        tracing::info!(chunks, path = %self.path.display(), "saved obfuscation cache");
        Ok(())
    }

    /// Drop all entries and delete the persisted file.
    pub fn clear(&self) -> CacheResult<()> {
        self.data.write().chunks.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Path of the persisted store file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(code: &str) -> CacheEntry {
        CacheEntry {
            module_hashes: BTreeMap::from([("src/a.js".to_string(), "aa11".to_string())]),
            obfuscated_code: code.to_string(),
            output_hash: None,
            file_name: "assets/app.abc.js".to_string(),
            chunk_name: "app".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_missing_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::load(&CacheConfig::new(dir.path()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupt_file_yields_empty_store() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig::new(dir.path());
        fs::write(config.store_path(), "not json {{{").unwrap();

        let store = CacheStore::load(&config);
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig::new(dir.path().join("nested"));

        let store = CacheStore::load(&config);
        store.put(ChunkKey::from_hex("k1"), entry("var _0x1;"));
        store.put(ChunkKey::from_hex("k2"), entry("var _0x2;"));
        store.save().unwrap();

        let reloaded = CacheStore::load(&config);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get(&ChunkKey::from_hex("k1")).unwrap(),
            store.get(&ChunkKey::from_hex("k1")).unwrap()
        );
        // No temp file left behind.
        assert!(!config.store_path().with_extension("tmp").exists());
    }

    #[test]
    fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::load(&CacheConfig::new(dir.path()));
        let key = ChunkKey::from_hex("k1");

        store.put(key.clone(), entry("first"));
        store.put(key.clone(), entry("second"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key).unwrap().obfuscated_code, "second");
    }

    #[test]
    fn test_update_existing_entry() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::load(&CacheConfig::new(dir.path()));
        let key = ChunkKey::from_hex("k1");
        store.put(key.clone(), entry("var _0x1;"));

        let updated = store.update(&key, |e| e.output_hash = Some("h4sh".to_string()));
        assert!(updated);
        assert_eq!(store.get(&key).unwrap().output_hash.as_deref(), Some("h4sh"));

        let missing = store.update(&ChunkKey::from_hex("absent"), |_| {});
        assert!(!missing);
    }

    #[test]
    fn test_clear_removes_file_and_entries() {
        let dir = TempDir::new().unwrap();
        let config = CacheConfig::new(dir.path());
        let store = CacheStore::load(&config);
        store.put(ChunkKey::from_hex("k1"), entry("var _0x1;"));
        store.save().unwrap();
        assert!(config.store_path().exists());

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(!config.store_path().exists());

        // Clearing again is a no-op.
        store.clear().unwrap();
    }
}
