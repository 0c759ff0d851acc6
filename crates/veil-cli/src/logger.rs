//! Logging setup for the veil CLI.
//!
//! The library only emits tracing events; the CLI installs the subscriber.
//! `RUST_LOG` overrides the flag-derived level.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// Call once at startup, before any logging occurs. `verbose` wins over
/// `quiet`.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .without_time()
                .with_ansi(!no_color),
        )
        .init();

    if no_color {
        console::set_colors_enabled(false);
    }
}
