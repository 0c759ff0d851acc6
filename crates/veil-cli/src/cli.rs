//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Obfuscation cache maintenance.
#[derive(Debug, Parser)]
#[command(name = "veil", version, about = "Obfuscation cache maintenance for bundler pipelines")]
pub struct Cli {
    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show statistics for the persisted cache store
    Stats(StatsArgs),
    /// Delete the persisted cache store
    Clear(ClearArgs),
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Cache directory containing the store file
    #[arg(long, default_value = ".cache/veil")]
    pub cache_dir: PathBuf,

    /// List every cached chunk
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Cache directory containing the store file
    #[arg(long, default_value = ".cache/veil")]
    pub cache_dir: PathBuf,
}
