//! Output filename reconciliation.
//!
//! Bundlers reassign content hashes in output filenames every build, even
//! when the emitted bytes are identical. This pass runs once over the full
//! emitted set, after all chunks are rendered: chunks with a previously
//! recorded output hash are renamed back to their canonical filename, and
//! chunks seen for the first time have this build's hash recorded as
//! canonical for future builds.
//!
//! Renames are planned first and applied in two phases (remove every
//! source, then insert every target) so rename chains cannot clobber a
//! chunk that has not moved yet. A target claimed by two distinct keys, or
//! colliding with a file that is not moving, aborts only those renames:
//! the affected chunks keep their provisional names and the conflict is
//! logged loudly, since silently colliding two output files would corrupt
//! the deployed artifact set.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::artifact::ArtifactCache;
use crate::entry::ChunkDescriptor;

/// Trailing `.<hash>.js` component of an emitted filename.
static OUTPUT_HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([A-Za-z0-9_-]+)\.js$").expect("valid hash pattern"));

/// Minimal record of one emitted chunk file, as handed over by the
/// bundler's finalization hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedChunk {
    /// Logical chunk name.
    pub name: String,
    /// Assigned output filename; rewritten when the chunk is renamed.
    pub file_name: String,
    /// Ids of the modules bundled into this chunk.
    pub module_ids: Vec<String>,
    /// Final chunk code.
    pub code: String,
    /// Filenames of chunks this chunk imports; remapped on rename.
    pub imports: Vec<String>,
}

impl EmittedChunk {
    /// Descriptor for key derivation.
    pub fn descriptor(&self) -> ChunkDescriptor {
        ChunkDescriptor {
            name: self.name.clone(),
            file_name: self.file_name.clone(),
            module_ids: self.module_ids.clone(),
        }
    }
}

/// The bundler's full output set, keyed by assigned filename.
pub type EmittedBundle = FxHashMap<String, EmittedChunk>;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Files renamed back to their canonical hash.
    pub renamed: usize,
    /// Entries that learned their canonical hash this build.
    pub seeded: usize,
    /// Renames abandoned because of a target collision.
    pub conflicts: usize,
}

/// Extract the output hash embedded in an emitted filename, if any.
pub fn extract_output_hash(file_name: &str) -> Option<&str> {
    OUTPUT_HASH_RE
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Substitute `new_hash` for the hash component of `file_name`.
fn replace_output_hash(file_name: &str, new_hash: &str) -> Option<String> {
    let m = OUTPUT_HASH_RE.captures(file_name)?.get(1)?;
    let mut out = String::with_capacity(file_name.len());
    out.push_str(&file_name[..m.start()]);
    out.push_str(new_hash);
    out.push_str(&file_name[m.end()..]);
    Some(out)
}

struct PlannedRename {
    from: String,
    to: String,
}

/// Restore stable output filenames across the emitted set.
///
/// Must run exactly once per build, after every chunk has been rendered,
/// single-threaded: conflict detection needs the complete output set.
pub fn reconcile(cache: &ArtifactCache, bundle: &mut EmittedBundle) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    let mut renames: Vec<PlannedRename> = Vec::new();

    // Walk in sorted order so conflict resolution is deterministic.
    let mut file_names: Vec<String> = bundle.keys().cloned().collect();
    file_names.sort_unstable();

    for file_name in &file_names {
        let chunk = &bundle[file_name];
        let Some(current_hash) = extract_output_hash(file_name) else {
            continue;
        };
        let descriptor = chunk.descriptor();

        let Some(entry) = cache.entry_for(&descriptor) else {
            // Never cached this build (e.g. the transform failed for it).
            continue;
        };

        match entry.output_hash {
            Some(prior_hash) if prior_hash != current_hash => {
                if let Some(target) = replace_output_hash(file_name, &prior_hash) {
                    renames.push(PlannedRename {
                        from: file_name.clone(),
                        to: target,
                    });
                }
            }
            Some(_) => {}
            None => {
                cache.finalize_output_name(&descriptor, current_hash);
                summary.seeded += 1;
            }
        }
    }

    // Conflict detection over the complete plan.
    let mut target_counts: FxHashMap<String, usize> = FxHashMap::default();
    for rename in &renames {
        *target_counts.entry(rename.to.clone()).or_default() += 1;
    }
    let renamed_away: FxHashSet<String> = renames.iter().map(|r| r.from.clone()).collect();

    let mut apply = Vec::new();
    for rename in renames {
        let duplicate_target = target_counts.get(&rename.to).copied().unwrap_or(0) > 1;
        let collides_with_static =
            bundle.contains_key(&rename.to) && !renamed_away.contains(&rename.to);
        if duplicate_target || collides_with_static {
            tracing::error!(
                from = %rename.from,
                to = %rename.to,
                "output rename conflict, keeping provisional file name"
            );
            summary.conflicts += 1;
            continue;
        }
        apply.push(rename);
    }

    // Two-phase apply: detach every moving chunk before re-inserting any,
    // so a chain like a->b, b->c never overwrites b in place.
    let mut moved = Vec::with_capacity(apply.len());
    for rename in &apply {
        if let Some(chunk) = bundle.remove(&rename.from) {
            moved.push((rename, chunk));
        }
    }
    for (rename, mut chunk) in moved {
        chunk.file_name = rename.to.clone();
        tracing::info!(from = %rename.from, to = %rename.to, "restored stable output hash");
        bundle.insert(rename.to.clone(), chunk);
        summary.renamed += 1;
    }

    // Remap structural references to moved files.
    if !apply.is_empty() {
        let rename_map: FxHashMap<&str, &str> = apply
            .iter()
            .map(|r| (r.from.as_str(), r.to.as_str()))
            .collect();
        for chunk in bundle.values_mut() {
            for import in &mut chunk.imports {
                if let Some(new_name) = rename_map.get(import.as_str()) {
                    *import = (*new_name).to_string();
                }
            }
        }
    }

    summary
}
