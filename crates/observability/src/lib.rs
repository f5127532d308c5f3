//! Process-wide tracing setup.
//!
//! JSON lines to stdout, filter from `RUST_LOG` with an `info` default.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init so tests calling this repeatedly do not panic.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_target(false)
        .try_init();
}
