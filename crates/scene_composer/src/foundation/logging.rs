//! Logging utilities
//!
//! The library logs through the `log` facade only; binaries pick the sink
//! and verbosity by calling [`init`] or [`init_with_debug`] once at startup.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system at info level
///
/// `RUST_LOG` still overrides the filter, as usual for `env_logger`.
pub fn init() {
    init_with_debug(false);
}

/// Initialize the logging system, optionally raising the filter to debug
///
/// Batch builds expose this as a `--debug` flag; anchor-resolution reasons
/// and other per-slot detail log at debug level.
pub fn init_with_debug(debug: bool) {
    env_logger::Builder::from_default_env()
        .filter_level(if debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();
}
