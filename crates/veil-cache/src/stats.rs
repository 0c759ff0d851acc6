//! Hit/miss accounting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts cache hits and fresh transforms for one build.
///
/// Counters are atomic so parallel chunk workers can report without a lock.
#[derive(Debug, Default)]
pub struct StatsCollector {
    cached: AtomicU64,
    obfuscated: AtomicU64,
}

impl StatsCollector {
    /// Create a collector with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit.
    pub fn record_hit(&self) {
        self.cached.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a freshly transformed chunk.
    pub fn record_obfuscated(&self) {
        self.obfuscated.fetch_add(1, Ordering::Relaxed);
    }

    /// Aggregate the counters into a report.
    pub fn report(&self) -> CacheStats {
        CacheStats::new(
            self.cached.load(Ordering::Relaxed),
            self.obfuscated.load(Ordering::Relaxed),
        )
    }
}

/// Aggregated cache statistics for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Chunks served from the cache.
    pub cached: u64,
    /// Chunks freshly obfuscated this build.
    pub obfuscated: u64,
    /// Total chunks seen.
    pub total: u64,
    /// `round(100 * cached / total)`, or 0 when no chunks were seen.
    pub hit_rate: u8,
}

impl CacheStats {
    fn new(cached: u64, obfuscated: u64) -> Self {
        let total = cached + obfuscated;
        let hit_rate = if total > 0 {
            ((cached as f64 / total as f64) * 100.0).round() as u8
        } else {
            0
        };
        Self {
            cached,
            obfuscated,
            total,
            hit_rate,
        }
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} cached, {} obfuscated ({}% hit rate)",
            self.cached, self.obfuscated, self.hit_rate
        )
    }
}
