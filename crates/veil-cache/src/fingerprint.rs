//! Module content fingerprinting.
//!
//! The fingerprint map lives for a single build: it is filled during the
//! bundler's transform phase and consulted during key derivation. Nothing
//! here is ever persisted on its own.

use dashmap::DashMap;

/// Decides which modules participate in fingerprinting.
///
/// First-party code should always participate. Third-party code is mostly
/// stable between builds and would only bloat the key space, but some
/// dependencies (a framework runtime inlined into chunks, for example) do
/// affect transform output and must be included.
pub trait FingerprintPolicy: Send + Sync {
    /// Return true if the module's content should be hashed.
    fn should_track(&self, module_id: &str) -> bool;
}

/// Default policy: every first-party module, plus an explicit allow-list of
/// third-party packages.
///
/// A module id containing a `node_modules` path segment is third-party; it
/// is tracked only when its package name (the segment after the last
/// `node_modules/`, scope prefix included) appears in the allow-list.
#[derive(Debug, Clone, Default)]
pub struct DependencyAllowList {
    tracked: Vec<String>,
}

impl DependencyAllowList {
    /// Create an allow-list from package names.
    pub fn new(tracked: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tracked: tracked.into_iter().map(Into::into).collect(),
        }
    }
}

impl FingerprintPolicy for DependencyAllowList {
    fn should_track(&self, module_id: &str) -> bool {
        if !module_id.contains("node_modules") {
            return true;
        }
        package_name(module_id).is_some_and(|pkg| self.tracked.iter().any(|t| t == pkg))
    }
}

/// Extract the package name following the last `node_modules/` segment,
/// keeping the scope prefix for scoped packages.
fn package_name(module_id: &str) -> Option<&str> {
    const MARKER: &str = "node_modules/";
    let idx = module_id.rfind(MARKER)?;
    let rest = &module_id[idx + MARKER.len()..];
    let mut segments = rest.split('/');
    let first = segments.next().filter(|s| !s.is_empty())?;
    if first.starts_with('@') {
        let second = segments.next().filter(|s| !s.is_empty())?;
        Some(&rest[..first.len() + 1 + second.len()])
    } else {
        Some(first)
    }
}

/// Per-build source fingerprint map.
///
/// `track` may be called from parallel transform workers; each module id
/// writes a disjoint key, so the concurrent map is the only coordination
/// needed.
pub struct SourceHasher {
    hashes: DashMap<String, String>,
    policy: Box<dyn FingerprintPolicy>,
}

impl SourceHasher {
    /// Create a hasher with the given inclusion policy.
    pub fn new(policy: Box<dyn FingerprintPolicy>) -> Self {
        Self {
            hashes: DashMap::new(),
            policy,
        }
    }

    /// Hash `content` and store it keyed by `module_id`, overwriting any
    /// prior value from this build. Modules the policy excludes are ignored.
    pub fn track(&self, module_id: &str, content: &str) {
        if !self.policy.should_track(module_id) {
            return;
        }
        self.hashes
            .insert(module_id.to_string(), hash_content(content));
    }

    /// Current fingerprint for a module, if tracked this build.
    pub fn fingerprint(&self, module_id: &str) -> Option<String> {
        self.hashes.get(module_id).map(|h| h.value().clone())
    }

    /// Number of tracked modules.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True if nothing has been tracked yet.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl std::fmt::Debug for SourceHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceHasher")
            .field("tracked", &self.hashes.len())
            .finish()
    }
}

/// BLAKE3 hex digest over content bytes.
pub(crate) fn hash_content(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
