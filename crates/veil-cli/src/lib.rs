//! # veil-cli
//!
//! Maintenance CLI for the veil obfuscation cache: inspect the persisted
//! store and clear it between builds.

pub mod cli;
pub mod commands;
pub mod logger;
