//! Tracing setup shared by the binaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` for this crate.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(default_level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "smart_park={}",
            default_level.as_str().to_ascii_lowercase()
        ))
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}
