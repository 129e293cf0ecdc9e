//! Log output: `tracing` events written to stderr, filtered by the
//! configured level unless `RUST_LOG` is set.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

static FILTER: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the global subscriber at `info`. Later calls are no-ops.
pub fn init_tracing() {
    let (filter, handle) = reload::Layer::new(filter_for("info"));
    if FILTER.set(handle).is_err() {
        return;
    }
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Switch to the level from the loaded configuration.
pub fn apply_logging_level(level: &str) {
    let Some(handle) = FILTER.get() else {
        return;
    };
    if let Err(err) = handle.reload(filter_for(level)) {
        tracing::warn!(level = %level, error = %err, "could not apply logging level");
    }
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}
