//! One-shot switch into Time Capsule requested by a link.
//!
//! A link carrying `auto_time_capsule=true` asks the viewer to open in Time
//! Capsule. The trigger accepts the request only when the subject has moments
//! and the viewer is settled in Classic; it strips the parameter right away and
//! toggles after a delay if those conditions still hold.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use capsule_types::ViewMode;

use crate::constants::AUTO_ACTIVATION_PARAM;
use crate::ports::NavigationSignals;
use crate::timer::ScheduledTask;
use crate::transition::ViewTransitionCoordinator;

/// Lifecycle of the one-shot request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    /// No request consumed yet.
    Watching,
    /// Request consumed, toggle pending.
    Scheduled,
    /// Delay elapsed and the toggle ran.
    Fired,
    /// Delay elapsed but the guard no longer held.
    Skipped,
    /// Cancelled before the delay elapsed.
    Cancelled,
}

pub struct AutoActivationTrigger {
    coordinator: ViewTransitionCoordinator,
    navigation: Arc<dyn NavigationSignals>,
    delay: Duration,
    state: Arc<Mutex<TriggerState>>,
    pending: Mutex<Option<ScheduledTask>>,
}

impl AutoActivationTrigger {
    pub fn new(
        coordinator: ViewTransitionCoordinator,
        navigation: Arc<dyn NavigationSignals>,
        delay: Duration,
    ) -> Self {
        Self {
            coordinator,
            navigation,
            delay,
            state: Arc::new(Mutex::new(TriggerState::Watching)),
            pending: Mutex::new(None),
        }
    }

    pub fn state(&self) -> TriggerState {
        *self.state.lock()
    }

    /// Look at the navigation signal and the guard.
    ///
    /// Call whenever the query string, the moments count, or the view state may
    /// have changed. Returns `true` only on the call that consumed the request.
    /// Must be called within a tokio runtime.
    pub fn evaluate(&self, moments_count: u64) -> bool {
        let mut state = self.state.lock();
        if *state != TriggerState::Watching {
            return false;
        }
        let requested = self
            .navigation
            .query_param(AUTO_ACTIVATION_PARAM)
            .is_some_and(|v| v == "true");
        if !requested || !guard(&self.coordinator, moments_count) {
            return false;
        }

        self.navigation.remove_query_param(AUTO_ACTIVATION_PARAM);
        *state = TriggerState::Scheduled;
        info!(moments_count, delay_ms = self.delay.as_millis() as u64, "auto activation scheduled");

        let coordinator = self.coordinator.clone();
        let shared = Arc::clone(&self.state);
        let task = ScheduledTask::after(self.delay, async move {
            let fired = guard(&coordinator, moments_count) && coordinator.toggle();
            let mut state = shared.lock();
            if *state == TriggerState::Scheduled {
                *state = if fired {
                    TriggerState::Fired
                } else {
                    TriggerState::Skipped
                };
            }
            if !fired {
                debug!("auto activation skipped, guard no longer holds");
            }
        });
        *self.pending.lock() = Some(task);
        true
    }

    /// Abort a pending toggle. No effect once it has fired.
    pub fn cancel(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.cancel();
        }
        let mut state = self.state.lock();
        if *state == TriggerState::Scheduled {
            *state = TriggerState::Cancelled;
            debug!("auto activation cancelled");
        }
    }
}

impl Drop for AutoActivationTrigger {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn guard(coordinator: &ViewTransitionCoordinator, moments_count: u64) -> bool {
    moments_count > 0 && coordinator.mode() == ViewMode::Classic && !coordinator.is_transitioning()
}
