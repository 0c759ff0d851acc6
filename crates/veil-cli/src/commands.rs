//! Command implementations.

use std::fs;
use std::io;

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use veil_cache::{CacheConfig, CacheStore};

use crate::cli::{ClearArgs, StatsArgs};

/// `veil stats`: report on the persisted store.
pub fn stats_execute(args: StatsArgs) -> Result<()> {
    let config = CacheConfig::new(&args.cache_dir);
    let path = config.store_path();

    if !path.exists() {
        println!("no cache store at {}", style(path.display()).dim());
        return Ok(());
    }

    let size = fs::metadata(&path)
        .into_diagnostic()
        .wrap_err("failed to stat cache store")?
        .len();
    let store = CacheStore::load(&config);
    let entries = store.entries();
    let stabilized = entries
        .iter()
        .filter(|(_, e)| e.output_hash.is_some())
        .count();

    println!("{} {}", style("cache store").bold(), path.display());
    println!("  chunks:     {}", entries.len());
    println!("  stabilized: {stabilized}");
    println!("  size:       {}", format_size(size));

    if args.list {
        println!();
        for (key, entry) in entries {
            println!(
                "  {}  {:<20}  {:<10}  {}",
                style(short_key(&key)).dim(),
                entry.chunk_name,
                entry.output_hash.as_deref().unwrap_or("-"),
                entry.file_name
            );
        }
    }

    Ok(())
}

/// `veil clear`: delete the persisted store.
pub fn clear_execute(args: ClearArgs) -> Result<()> {
    let config = CacheConfig::new(&args.cache_dir);
    let path = config.store_path();

    match fs::remove_file(&path) {
        Ok(()) => {
            println!(
                "{} cleared cache store at {}",
                style("ok").green().bold(),
                path.display()
            );
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            println!("nothing to clear at {}", style(path.display()).dim());
            Ok(())
        }
        Err(err) => Err(err)
            .into_diagnostic()
            .wrap_err("failed to clear cache store"),
    }
}

fn short_key(key: &veil_cache::ChunkKey) -> &str {
    let hex = key.as_hex();
    &hex[..hex.len().min(12)]
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
