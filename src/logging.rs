//! Tracing setup.
//!
//! Nested operations log inside spans (`source{id=...}`, `mailbox`, `batch`),
//! so the fmt layer prints their context as a prefix for the span's lifetime.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directives. `--verbose` turns on this crate's debug events.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "info,feedpocket=debug"
    } else {
        "info"
    }
}

/// Initialize the global subscriber. `RUST_LOG` takes precedence over `verbose`.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
        .with(filter)
        .init();
}
