//! Build-pipeline hooks.
//!
//! [`ObfuscationPipeline`] is the handle an embedder constructs once per
//! build and threads through the bundler's hook points, in order:
//!
//! 1. [`track_module`](ObfuscationPipeline::track_module) per module during
//!    the transform phase (parallel-safe),
//! 2. [`render_chunk`](ObfuscationPipeline::render_chunk) per chunk once
//!    every member module has been tracked (independent chunks may run
//!    concurrently),
//! 3. [`finalize_bundle`](ObfuscationPipeline::finalize_bundle) once over
//!    the complete output set,
//! 4. [`close`](ObfuscationPipeline::close) at shutdown.

use crate::artifact::ArtifactCache;
use crate::config::CacheConfig;
use crate::entry::ChunkDescriptor;
use crate::fingerprint::FingerprintPolicy;
use crate::reconcile::{EmittedBundle, ReconcileSummary, reconcile};
use crate::stats::CacheStats;

/// The external obfuscation transform.
///
/// Implementations must be deterministic: identical source must always
/// yield identical output, since cached output is reused indefinitely for
/// unchanged input. The cache imposes no timeout; cost and cancellation
/// are the implementation's own contract.
pub trait Obfuscator: Send + Sync {
    /// Transform one chunk's source, or fail.
    fn obfuscate(&self, source: &str) -> anyhow::Result<String>;
}

impl<F> Obfuscator for F
where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync,
{
    fn obfuscate(&self, source: &str) -> anyhow::Result<String> {
        self(source)
    }
}

/// Per-build cache handle binding the bundler's hooks to the transform.
pub struct ObfuscationPipeline<T> {
    cache: ArtifactCache,
    obfuscator: T,
}

impl<T: Obfuscator> ObfuscationPipeline<T> {
    /// Open the cache and bind it to the transform.
    pub fn new(config: &CacheConfig, obfuscator: T) -> Self {
        Self {
            cache: ArtifactCache::open(config),
            obfuscator,
        }
    }

    /// Like [`ObfuscationPipeline::new`] with a custom fingerprint policy.
    pub fn with_policy(
        config: &CacheConfig,
        policy: Box<dyn FingerprintPolicy>,
        obfuscator: T,
    ) -> Self {
        Self {
            cache: ArtifactCache::with_policy(config, policy),
            obfuscator,
        }
    }

    /// Per-module hook: fingerprint source content.
    pub fn track_module(&self, module_id: &str, source: &str) {
        self.cache.track_module(module_id, source);
    }

    /// Per-chunk hook: return the code to emit for this chunk, or `None`
    /// to keep the bundler's own output.
    ///
    /// Non-JS chunks are skipped. On a hit the cached code is returned; on
    /// a miss the transform runs and its output is recorded. A transform
    /// failure is isolated to this chunk: it is logged and the chunk falls
    /// back to its untransformed code.
    pub fn render_chunk(&self, code: &str, chunk: &ChunkDescriptor) -> Option<String> {
        if !chunk.file_name.ends_with(".js") {
            return None;
        }

        if let Some(entry) = self.cache.lookup(chunk) {
            tracing::debug!(
                chunk = %chunk.name,
                output_hash = entry.output_hash.as_deref().unwrap_or("-"),
                "reusing cached obfuscated chunk"
            );
            return Some(entry.obfuscated_code);
        }

        tracing::debug!(chunk = %chunk.name, "obfuscating chunk");
        match self.obfuscator.obfuscate(code) {
            Ok(obfuscated) => {
                self.cache.record(chunk, obfuscated.as_str());
                Some(obfuscated)
            }
            Err(err) => {
                tracing::error!(
                    chunk = %chunk.name,
                    %err,
                    "obfuscation failed, emitting chunk unmodified"
                );
                None
            }
        }
    }

    /// Bundle-finalization hook: restore stable filenames across the full
    /// emitted set. Call exactly once, after every chunk is rendered.
    pub fn finalize_bundle(&self, bundle: &mut EmittedBundle) -> ReconcileSummary {
        let summary = reconcile(&self.cache, bundle);
        if summary.renamed > 0 || summary.seeded > 0 {
            tracing::info!(
                renamed = summary.renamed,
                seeded = summary.seeded,
                conflicts = summary.conflicts,
                "reconciled output file names"
            );
        }
        summary
    }

    /// Shutdown hook: report statistics and persist the store.
    ///
    /// A save failure costs only the next build's cache benefit, so it is
    /// logged rather than propagated.
    pub fn close(&self) -> CacheStats {
        let stats = self.cache.stats();
        tracing::info!(
            cached = stats.cached,
            obfuscated = stats.obfuscated,
            total = stats.total,
            hit_rate = stats.hit_rate,
            "obfuscation cache summary"
        );
        if let Err(err) = self.cache.persist() {
            tracing::error!(%err, "failed to save obfuscation cache");
        }
        stats
    }

    /// The underlying cache handle.
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }
}
