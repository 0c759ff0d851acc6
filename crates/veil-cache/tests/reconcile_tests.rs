//! Reconciliation of output filenames across builds.

use tempfile::TempDir;
use veil_cache::{
    ArtifactCache, CacheConfig, ChunkDescriptor, EmittedBundle, EmittedChunk,
    ObfuscationPipeline, reconcile,
};

fn reverse(source: &str) -> anyhow::Result<String> {
    Ok(source.chars().rev().collect())
}

fn emitted(name: &str, file_name: &str, module_ids: &[&str], imports: &[&str]) -> EmittedChunk {
    EmittedChunk {
        name: name.to_string(),
        file_name: file_name.to_string(),
        module_ids: module_ids.iter().map(|s| s.to_string()).collect(),
        code: String::new(),
        imports: imports.iter().map(|s| s.to_string()).collect(),
    }
}

fn bundle_of(chunks: Vec<EmittedChunk>) -> EmittedBundle {
    chunks
        .into_iter()
        .map(|c| (c.file_name.clone(), c))
        .collect()
}

#[test]
fn first_build_seeds_output_hashes() {
    let temp = TempDir::new().unwrap();
    let config = CacheConfig::new(temp.path());

    let pipeline = ObfuscationPipeline::new(&config, reverse);
    pipeline.track_module("src/app.js", "const app = 1;");
    let chunk = ChunkDescriptor::new("app", "assets/app.h4sh01.js", ["src/app.js"]);
    pipeline.render_chunk("const app = 1;", &chunk).unwrap();

    let mut bundle = bundle_of(vec![emitted(
        "app",
        "assets/app.h4sh01.js",
        &["src/app.js"],
        &[],
    )]);
    let summary = pipeline.finalize_bundle(&mut bundle);

    assert_eq!(summary.seeded, 1);
    assert_eq!(summary.renamed, 0);

    let entry = pipeline.cache().entry_for(&chunk).unwrap();
    assert_eq!(entry.output_hash.as_deref(), Some("h4sh01"));
    assert_eq!(entry.file_name, "assets/app.h4sh01.js");
}

#[test]
fn rebuild_restores_prior_hash_and_remaps_imports() {
    let temp = TempDir::new().unwrap();
    let config = CacheConfig::new(temp.path());

    // Build 1: seed the canonical hash.
    let build1 = ObfuscationPipeline::new(&config, reverse);
    build1.track_module("src/app.js", "const app = 1;");
    build1.track_module("src/index.js", "import './app';");
    let app1 = ChunkDescriptor::new("app", "assets/app.aaa111.js", ["src/app.js"]);
    let index1 = ChunkDescriptor::new("index", "assets/index.bbb222.js", ["src/index.js"]);
    build1.render_chunk("const app = 1;", &app1).unwrap();
    build1.render_chunk("import './app';", &index1).unwrap();
    let mut bundle1 = bundle_of(vec![
        emitted("app", "assets/app.aaa111.js", &["src/app.js"], &[]),
        emitted(
            "index",
            "assets/index.bbb222.js",
            &["src/index.js"],
            &["assets/app.aaa111.js"],
        ),
    ]);
    build1.finalize_bundle(&mut bundle1);
    build1.close();

    // Build 2: same content, but the bundler hands out new hashes.
    let build2 = ObfuscationPipeline::new(&config, reverse);
    build2.track_module("src/app.js", "const app = 1;");
    build2.track_module("src/index.js", "import './app';");
    let app2 = ChunkDescriptor::new("app", "assets/app.ccc333.js", ["src/app.js"]);
    let index2 = ChunkDescriptor::new("index", "assets/index.ddd444.js", ["src/index.js"]);
    assert!(build2.render_chunk("const app = 1;", &app2).is_some());
    assert!(build2.render_chunk("import './app';", &index2).is_some());

    let mut bundle2 = bundle_of(vec![
        emitted("app", "assets/app.ccc333.js", &["src/app.js"], &[]),
        emitted(
            "index",
            "assets/index.ddd444.js",
            &["src/index.js"],
            &["assets/app.ccc333.js"],
        ),
    ]);
    let summary = build2.finalize_bundle(&mut bundle2);

    assert_eq!(summary.renamed, 2);
    assert_eq!(summary.conflicts, 0);

    // Both files surface under their build-1 names.
    assert!(bundle2.contains_key("assets/app.aaa111.js"));
    assert!(bundle2.contains_key("assets/index.bbb222.js"));
    assert!(!bundle2.contains_key("assets/app.ccc333.js"));
    assert_eq!(
        bundle2["assets/app.aaa111.js"].file_name,
        "assets/app.aaa111.js"
    );

    // The import reference followed the rename.
    assert_eq!(
        bundle2["assets/index.bbb222.js"].imports,
        vec!["assets/app.aaa111.js".to_string()]
    );
}

#[test]
fn rename_chain_applies_cleanly() {
    let temp = TempDir::new().unwrap();
    let config = CacheConfig::new(temp.path());
    let cache = ArtifactCache::open(&config);

    cache.track_module("src/a.js", "const a = 1;");
    cache.track_module("src/b.js", "const b = 1;");

    // Canonical names: a -> app.bbb.js, b -> app.ccc.js.
    let a = ChunkDescriptor::new("a", "app.bbb.js", ["src/a.js"]);
    cache.record(&a, "a;");
    cache.finalize_output_name(&a, "bbb");
    let b = ChunkDescriptor::new("b", "app.ccc.js", ["src/b.js"]);
    cache.record(&b, "b;");
    cache.finalize_output_name(&b, "ccc");

    // This build emitted a at app.aaa.js and b at app.bbb.js: a's target
    // is exactly b's current name.
    let mut bundle = bundle_of(vec![
        emitted("a", "app.aaa.js", &["src/a.js"], &[]),
        emitted("b", "app.bbb.js", &["src/b.js"], &[]),
    ]);
    let summary = reconcile(&cache, &mut bundle);

    assert_eq!(summary.renamed, 2);
    assert_eq!(summary.conflicts, 0);
    assert_eq!(bundle["app.bbb.js"].name, "a");
    assert_eq!(bundle["app.ccc.js"].name, "b");
}

#[test]
fn conflicting_targets_keep_provisional_names() {
    let temp = TempDir::new().unwrap();
    let config = CacheConfig::new(temp.path());
    let cache = ArtifactCache::open(&config);

    cache.track_module("src/a.js", "const a = 1;");
    cache.track_module("src/b.js", "const b = 1;");

    // Two distinct keys were both finalized to the same hash - the
    // pathological collision the reconciler must refuse to apply.
    let a = ChunkDescriptor::new("a", "app.x1.js", ["src/a.js"]);
    cache.record(&a, "a;");
    cache.finalize_output_name(&a, "stable");
    let b = ChunkDescriptor::new("b", "app.x2.js", ["src/b.js"]);
    cache.record(&b, "b;");
    cache.finalize_output_name(&b, "stable");

    let mut bundle = bundle_of(vec![
        emitted("a", "app.x1.js", &["src/a.js"], &[]),
        emitted("b", "app.x2.js", &["src/b.js"], &[]),
    ]);
    let summary = reconcile(&cache, &mut bundle);

    assert_eq!(summary.renamed, 0);
    assert_eq!(summary.conflicts, 2);
    assert!(bundle.contains_key("app.x1.js"));
    assert!(bundle.contains_key("app.x2.js"));
    assert!(!bundle.contains_key("app.stable.js"));
}

#[test]
fn unhashed_and_uncached_files_are_left_alone() {
    let temp = TempDir::new().unwrap();
    let config = CacheConfig::new(temp.path());
    let cache = ArtifactCache::open(&config);

    // "index.js" has no hash component; "orphan" was never cached.
    let mut bundle = bundle_of(vec![
        emitted("index", "index.js", &["src/index.js"], &[]),
        emitted("orphan", "assets/orphan.eee555.js", &["src/orphan.js"], &[]),
    ]);
    let summary = reconcile(&cache, &mut bundle);

    assert_eq!(summary, Default::default());
    assert!(bundle.contains_key("index.js"));
    assert!(bundle.contains_key("assets/orphan.eee555.js"));
}

#[test]
fn stable_hash_survives_three_builds() {
    let temp = TempDir::new().unwrap();
    let config = CacheConfig::new(temp.path());

    let mut prior_name = String::new();
    for build in 0..3 {
        let pipeline = ObfuscationPipeline::new(&config, reverse);
        pipeline.track_module("src/app.js", "const app = 1;");

        // The bundler invents a new hash every build.
        let assigned = format!("assets/app.gen{build:03}.js");
        let chunk = ChunkDescriptor::new("app", assigned.clone(), ["src/app.js"]);
        pipeline.render_chunk("const app = 1;", &chunk).unwrap();

        let mut bundle = bundle_of(vec![emitted("app", &assigned, &["src/app.js"], &[])]);
        pipeline.finalize_bundle(&mut bundle);
        pipeline.close();

        let final_name = bundle.keys().next().unwrap().clone();
        if build > 0 {
            assert_eq!(final_name, prior_name, "output name drifted on build {build}");
        }
        prior_name = final_name;
    }
}
