//! veil - obfuscation cache maintenance.
//!
//! Entry point: parses arguments, initializes logging, dispatches the
//! command.

use clap::Parser;
use miette::Result;
use veil_cli::{cli, commands, logger};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logger::init_logger(args.verbose, args.quiet, args.no_color);

    match args.command {
        cli::Command::Stats(stats_args) => commands::stats_execute(stats_args),
        cli::Command::Clear(clear_args) => commands::clear_execute(clear_args),
    }
}
