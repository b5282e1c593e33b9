//! Logging setup for grid construction and queries
//!
//! Grid builds log at `info`, saturated cells at `warn`, and per-query
//! detail at `debug`/`trace` under the `terrain_grid` target.

pub use log::{debug, info, warn, error, trace, LevelFilter};

/// Target prefix used by every log line from this crate
pub const LOG_TARGET: &str = "terrain_grid";

/// Install `env_logger`, honouring `RUST_LOG`
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::try_init();
}

/// Install `env_logger` with this crate logging at `level`; other modules follow `RUST_LOG`
///
/// Returns false if a logger was already installed.
pub fn init_with_level(level: LevelFilter) -> bool {
    env_logger::Builder::from_default_env()
        .filter_module(LOG_TARGET, level)
        .is_test(cfg!(test))
        .try_init()
        .is_ok()
}
