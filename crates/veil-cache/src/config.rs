//! Cache configuration.
//!
//! The embedder controls where the store file lives and which third-party
//! dependencies participate in fingerprinting. Everything else is derived.

use std::path::PathBuf;

/// File name of the persisted store inside the cache directory.
pub const STORE_FILE_NAME: &str = "obfuscation-cache.json";

/// Configuration for the obfuscation cache.
///
/// Cache keys are content-addressed, so invalidation is automatic; the only
/// tunables are the storage location, the forced-refresh flag, and the
/// dependency allow-list consumed by the default fingerprint policy.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory where the store file is kept.
    ///
    /// The store is a single JSON document at `<dir>/obfuscation-cache.json`.
    pub dir: PathBuf,

    /// Re-obfuscate every chunk even when a cached entry exists.
    ///
    /// When true the cache is bypassed for reads but still written to after
    /// each transform, refreshing stored output. Useful for CI or after an
    /// obfuscator upgrade.
    pub force_rebuild: bool,

    /// Third-party packages whose content participates in fingerprinting.
    ///
    /// First-party modules always participate. A dependency belongs here
    /// when its version affects transform output (e.g. a framework runtime
    /// that is inlined into chunks).
    pub tracked_dependencies: Vec<String>,
}

impl CacheConfig {
    /// Create a new config with the given cache directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            force_rebuild: false,
            tracked_dependencies: Vec::new(),
        }
    }

    /// Set the force rebuild flag.
    pub fn with_force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Add third-party packages to include in fingerprinting.
    pub fn with_tracked_dependencies(
        mut self,
        deps: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.tracked_dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Check if force rebuild is requested via config or environment.
    pub fn should_force_rebuild(&self) -> bool {
        self.force_rebuild || std::env::var_os("VEIL_FORCE_REBUILD").is_some()
    }

    /// Full path of the persisted store file.
    pub fn store_path(&self) -> PathBuf {
        self.dir.join(STORE_FILE_NAME)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(".cache/veil")
    }
}
