//! Analytics and log plumbing for the capsule viewer.
//!
//! Provides the analytics event vocabulary, the fire-and-forget
//! [`TelemetrySink`] seam the view coordinator emits through, and the
//! `tracing-subscriber` bootstrap used by hosts and test harnesses.
//!
//! # Activation
//!
//! Analytics emission is on by default and can be switched off per process:
//!
//! ```bash
//! CAPSULE_ANALYTICS_DISABLED=true cargo test
//! ```
//!
//! Log verbosity follows `RUST_LOG` (e.g. `RUST_LOG=capsule_core=debug`).

mod events;
mod sink;

pub use events::AnalyticsEvent;
pub use sink::{MemorySink, NullSink, TelemetryError, TelemetrySink, TracingSink};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Check whether analytics events should be emitted.
///
/// Returns `false` only when `CAPSULE_ANALYTICS_DISABLED` is set to `"true"`
/// (case-insensitive).
pub fn analytics_enabled() -> bool {
    !std::env::var("CAPSULE_ANALYTICS_DISABLED")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_filter` when `RUST_LOG` is unset or invalid. Safe to
/// call more than once; only the first call installs anything.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
