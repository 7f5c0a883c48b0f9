//! Structured logging initialization
//!
//! Provides consistent logging initialization across the workspace binaries.

use crate::env::{EnvSourceExt, ProcessEnv};
use tracing::span::EnteredSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guard that keeps the component span entered.
/// Drop this at the end of main to flush logs.
pub struct LogGuard {
    _span: EnteredSpan,
}

/// Initialize structured logging for a component.
///
/// Logs go to stdout. `RUST_LOG` overrides the default `info` filter and
/// `LOG_FORMAT=json` switches to one JSON object per line.
///
/// # Example
/// ```ignore
/// let _guard = init_logging("provision-app-users");
/// info!("Starting up...");
/// ```
pub fn init_logging(component: &str) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = ProcessEnv.var_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }

    let span = tracing::info_span!("component", name = %component).entered();
    LogGuard { _span: span }
}
