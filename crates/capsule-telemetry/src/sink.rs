//! Telemetry sinks.
//!
//! Emission is fire-and-forget: callers log a failed [`TelemetrySink::emit`]
//! and move on. Nothing that renders may depend on an event being delivered.

use parking_lot::Mutex;
use thiserror::Error;

use crate::AnalyticsEvent;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("analytics backend unavailable: {0}")]
    Unavailable(String),
}

/// Destination for analytics events.
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: AnalyticsEvent) -> Result<(), TelemetryError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn emit(&self, _event: AnalyticsEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Writes each event as an `info` record on the `capsule::analytics` target.
///
/// Respects [`analytics_enabled`](crate::analytics_enabled) at construction.
/// A disabled sink drops events and returns `Ok`.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    enabled: bool,
}

impl TracingSink {
    pub fn new() -> Self {
        Self {
            enabled: crate::analytics_enabled(),
        }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySink for TracingSink {
    fn emit(&self, event: AnalyticsEvent) -> Result<(), TelemetryError> {
        if !self.enabled {
            return Ok(());
        }
        tracing::info!(
            target: "capsule::analytics",
            event = event.name(),
            props = ?event.properties(),
            "analytics event"
        );
        Ok(())
    }
}

/// Keeps events in memory, for hosts that batch and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().clone()
    }

    /// Remove and return everything emitted so far.
    pub fn drain(&self) -> Vec<AnalyticsEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl TelemetrySink for MemorySink {
    fn emit(&self, event: AnalyticsEvent) -> Result<(), TelemetryError> {
        self.events.lock().push(event);
        Ok(())
    }
}
