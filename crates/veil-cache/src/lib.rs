//! # veil-cache
//!
//! Content-addressed cache for a deterministic code-obfuscation transform
//! running inside a bundler pipeline.
//!
//! Obfuscation is the slowest step of a production build, and bundlers
//! reassign output hashes every run even when nothing changed. veil caches
//! transform output per chunk, keyed by the content of the chunk's member
//! modules, and restores each unchanged chunk's prior output filename so
//! deployed artifacts stay byte- and name-stable build-over-build.
//!
//! # Architecture
//!
//! - **Content-addressed**: chunk keys are BLAKE3 digests over the sorted
//!   member module ids and their content fingerprints - never over
//!   transform output or filenames - so invalidation is automatic.
//! - **Durable**: the store is one JSON document, loaded at build start
//!   and written back atomically at shutdown. It grows monotonically;
//!   stale keys are kept until an explicit clear.
//! - **Degrading**: a missing or corrupt store file means a first build,
//!   a failed transform means one un-cached chunk, a failed save means one
//!   cold build. None of them fail the build.
//!
//! # Quick start
//!
//! ```no_run
//! use veil_cache::{CacheConfig, ChunkDescriptor, ObfuscationPipeline};
//!
//! let config = CacheConfig::new(".cache/veil").with_tracked_dependencies(["react"]);
//! let pipeline = ObfuscationPipeline::new(&config, |source: &str| -> anyhow::Result<String> {
//!     // stand-in for the real obfuscator
//!     Ok(source.to_string())
//! });
//!
//! // Phase 1: fingerprint modules as the bundler transforms them.
//! pipeline.track_module("src/index.js", "console.log(1);");
//!
//! // Phase 2: render chunks once their modules are tracked.
//! let chunk = ChunkDescriptor::new("index", "assets/index.abc123.js", ["src/index.js"]);
//! let _code = pipeline.render_chunk("console.log(1);", &chunk);
//!
//! // Phase 3 runs `finalize_bundle` over the emitted file set, then:
//! let stats = pipeline.close();
//! println!("{stats}");
//! ```

pub mod artifact;
pub mod config;
pub mod entry;
pub mod fingerprint;
pub mod key;
pub mod pipeline;
pub mod reconcile;
pub mod stats;
pub mod store;

pub use artifact::ArtifactCache;
pub use config::{CacheConfig, STORE_FILE_NAME};
pub use entry::{CacheEntry, ChunkDescriptor};
pub use fingerprint::{DependencyAllowList, FingerprintPolicy, SourceHasher};
pub use key::{ChunkKey, MISSING_FINGERPRINT, derive_chunk_key};
pub use pipeline::{ObfuscationPipeline, Obfuscator};
pub use reconcile::{
    EmittedBundle, EmittedChunk, ReconcileSummary, extract_output_hash, reconcile,
};
pub use stats::{CacheStats, StatsCollector};
pub use store::{CacheError, CacheStore};

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;
