//! Process-wide logging setup.
//!
//! The engine reports through `tracing`; the database and worker layers use
//! `log` macros, which `tracing-log` forwards into the same subscriber.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::TelemetryError;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. With `json` every event is one JSON
/// object per line, otherwise human-readable text.
///
/// Call once, early in `main`.
pub fn init_logging(json: bool) -> Result<(), TelemetryError> {
    tracing_log::LogTracer::init()?;

    let json_layer = json.then(|| fmt::layer().json().with_current_span(true));
    let text_layer = (!json).then(fmt::layer);

    let subscriber = Registry::default()
        .with(env_filter())
        .with(json_layer)
        .with(text_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::debug!(json, "logging initialized");
    Ok(())
}
