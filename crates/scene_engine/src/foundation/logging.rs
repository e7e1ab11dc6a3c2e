//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Honors `RUST_LOG`; defaults to `info` when the variable is unset.
pub fn init() {
    init_with_level(log::LevelFilter::Info);
}

/// Initialize the logging system with a default level filter
///
/// `RUST_LOG` still overrides the default. Calling this more than once is
/// harmless: later calls leave the installed logger in place.
pub fn init_with_level(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}
