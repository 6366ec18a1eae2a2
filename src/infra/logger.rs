// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins, then `NEKOTA_LOG`,
/// then the level from config.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("NEKOTA_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(level));

    // try_init: tests and embedders may already have a subscriber installed
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
