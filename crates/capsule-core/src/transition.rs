//! Animated switches between Classic and Time Capsule.
//!
//! A switch runs in two timed steps measured from its start:
//!
//! ```text
//! toggle()          +fade_out                 +total
//!    │                  │                        │
//!    ▼                  ▼                        ▼
//! hide current ──▶ persist mode, show target ──▶ settled
//!  (transitioning)     (still transitioning)
//! ```
//!
//! Only one switch can be in flight; `toggle()` during a switch is ignored.
//! Visibility flags are published on a `watch` channel and never written by
//! consumers. Dropping the last handle aborts any pending step.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use capsule_telemetry::{AnalyticsEvent, TelemetrySink};
use capsule_types::{TransitionState, ViewMode};

use crate::config::TransitionTiming;
use crate::session::UiSession;
use crate::timer::ScheduledTask;

/// Sub-phase of a switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Outgoing presentation fading, nothing visible.
    FadingOut,
    /// Mode flipped, incoming presentation visible, switch not yet settled.
    FadingIn,
}

/// Where the coordinator is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    Classic,
    EnteringTimeCapsule(Stage),
    TimeCapsule,
    EnteringClassic(Stage),
}

impl TransitionPhase {
    fn settled(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Classic => TransitionPhase::Classic,
            ViewMode::TimeCapsule => TransitionPhase::TimeCapsule,
        }
    }

    fn entering(target: ViewMode, stage: Stage) -> Self {
        match target {
            ViewMode::Classic => TransitionPhase::EnteringClassic(stage),
            ViewMode::TimeCapsule => TransitionPhase::EnteringTimeCapsule(stage),
        }
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(
            self,
            TransitionPhase::EnteringClassic(_) | TransitionPhase::EnteringTimeCapsule(_)
        )
    }

    fn is_fading_out(&self) -> bool {
        matches!(
            self,
            TransitionPhase::EnteringClassic(Stage::FadingOut)
                | TransitionPhase::EnteringTimeCapsule(Stage::FadingOut)
        )
    }

    /// Mode being entered, if a switch is in flight.
    pub fn target(&self) -> Option<ViewMode> {
        match self {
            TransitionPhase::EnteringClassic(_) => Some(ViewMode::Classic),
            TransitionPhase::EnteringTimeCapsule(_) => Some(ViewMode::TimeCapsule),
            _ => None,
        }
    }

    /// Flags rendering consumers see in this phase.
    fn visibility(&self) -> TransitionState {
        match self {
            TransitionPhase::Classic => TransitionState::settled(ViewMode::Classic),
            TransitionPhase::TimeCapsule => TransitionState::settled(ViewMode::TimeCapsule),
            TransitionPhase::EnteringClassic(Stage::FadingOut)
            | TransitionPhase::EnteringTimeCapsule(Stage::FadingOut) => TransitionState {
                is_transitioning: true,
                visible_classic: false,
                visible_timeline: false,
            },
            TransitionPhase::EnteringClassic(Stage::FadingIn) => TransitionState {
                is_transitioning: true,
                visible_classic: true,
                visible_timeline: false,
            },
            TransitionPhase::EnteringTimeCapsule(Stage::FadingIn) => TransitionState {
                is_transitioning: true,
                visible_classic: false,
                visible_timeline: true,
            },
        }
    }
}

/// Who is being viewed, for analytics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subject {
    pub address: String,
    pub moments_count: u64,
    pub tokens_count: u64,
}

struct Machine {
    phase: TransitionPhase,
    subject: Subject,
    fade: Option<ScheduledTask>,
    settle: Option<ScheduledTask>,
}

struct Inner {
    session: Arc<UiSession>,
    telemetry: Arc<dyn TelemetrySink>,
    timing: TransitionTiming,
    machine: Mutex<Machine>,
    state_tx: watch::Sender<TransitionState>,
}

/// Cheap-to-clone handle; all clones drive the same state machine.
#[derive(Clone)]
pub struct ViewTransitionCoordinator {
    inner: Arc<Inner>,
}

impl ViewTransitionCoordinator {
    /// Starts settled on the persisted mode.
    pub fn new(
        session: Arc<UiSession>,
        telemetry: Arc<dyn TelemetrySink>,
        timing: TransitionTiming,
    ) -> Self {
        let phase = TransitionPhase::settled(session.view_mode());
        let (state_tx, _) = watch::channel(phase.visibility());
        Self {
            inner: Arc::new(Inner {
                session,
                telemetry,
                timing,
                machine: Mutex::new(Machine {
                    phase,
                    subject: Subject::default(),
                    fade: None,
                    settle: None,
                }),
                state_tx,
            }),
        }
    }

    /// Persisted mode. During a switch this is the old mode until the fade-out
    /// completes.
    pub fn mode(&self) -> ViewMode {
        self.inner.session.view_mode()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.inner.machine.lock().phase
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase().is_transitioning()
    }

    /// Current visibility flags.
    pub fn snapshot(&self) -> TransitionState {
        *self.inner.state_tx.borrow()
    }

    /// Receiver that wakes on every visibility change.
    pub fn subscribe(&self) -> watch::Receiver<TransitionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn subject(&self) -> Subject {
        self.inner.machine.lock().subject.clone()
    }

    /// Set who is being viewed.
    ///
    /// A new address switches the session (which resets persisted values); if
    /// no switch is in flight the visible state follows the reset mode.
    pub fn set_subject(&self, address: impl Into<String>, moments_count: u64, tokens_count: u64) {
        let address = address.into();
        let mut machine = self.inner.machine.lock();
        let changed = self.inner.session.set_address(address.clone());
        machine.subject = Subject {
            address,
            moments_count,
            tokens_count,
        };
        if changed && !machine.phase.is_transitioning() {
            machine.phase = TransitionPhase::settled(self.inner.session.view_mode());
            self.inner.publish(machine.phase);
        }
    }

    /// Start an animated switch to the other mode.
    ///
    /// Returns `false` (and does nothing) while a switch is already in flight.
    /// Must be called within a tokio runtime.
    pub fn toggle(&self) -> bool {
        let mut machine = self.inner.machine.lock();
        if machine.phase.is_transitioning() {
            debug!(phase = ?machine.phase, "toggle ignored, transition in flight");
            return false;
        }

        let from = self.inner.session.view_mode();
        let target = from.toggled();
        machine.phase = TransitionPhase::entering(target, Stage::FadingOut);
        self.inner.publish(machine.phase);
        info!(from = from.as_str(), to = target.as_str(), "view transition started");

        let weak = Arc::downgrade(&self.inner);
        machine.fade = Some(ScheduledTask::after(self.inner.timing.fade_out, {
            let weak = weak.clone();
            async move { Inner::on_fade_out(&weak) }
        }));
        machine.settle = Some(ScheduledTask::after(self.inner.timing.total, async move {
            Inner::on_settle(&weak)
        }));

        let event = match target {
            ViewMode::TimeCapsule => AnalyticsEvent::TimeCapsuleEntered {
                address: machine.subject.address.clone(),
                moments_count: machine.subject.moments_count,
                tokens_count: machine.subject.tokens_count,
            },
            ViewMode::Classic => AnalyticsEvent::TimeCapsuleExited {
                address: machine.subject.address.clone(),
            },
        };
        drop(machine);

        if let Err(e) = self.inner.telemetry.emit(event) {
            warn!(error = %e, "analytics emission failed");
        }
        true
    }

    /// Apply a mode without animation or analytics.
    ///
    /// Ignored while a switch is in flight. Returns whether it was applied.
    pub fn set_mode(&self, mode: ViewMode) -> bool {
        let mut machine = self.inner.machine.lock();
        if machine.phase.is_transitioning() {
            debug!(mode = mode.as_str(), "set_mode ignored, transition in flight");
            return false;
        }
        self.inner.session.store_view_mode(mode);
        machine.phase = TransitionPhase::settled(mode);
        self.inner.publish(machine.phase);
        true
    }
}

impl Inner {
    fn publish(&self, phase: TransitionPhase) {
        self.state_tx.send_replace(phase.visibility());
    }

    fn on_fade_out(weak: &Weak<Inner>) {
        let Some(inner) = weak.upgrade() else { return };
        let mut machine = inner.machine.lock();
        if machine.phase.is_fading_out() {
            inner.flip(&mut machine);
        }
    }

    fn on_settle(weak: &Weak<Inner>) {
        let Some(inner) = weak.upgrade() else { return };
        let mut machine = inner.machine.lock();
        let Some(target) = machine.phase.target() else {
            return;
        };
        if machine.phase.is_fading_out() {
            inner.flip(&mut machine);
        }
        // A subject switch mid-flight resets the persisted mode.
        if inner.session.view_mode() != target {
            inner.session.store_view_mode(target);
        }
        machine.phase = TransitionPhase::settled(target);
        inner.publish(machine.phase);
        debug!(mode = target.as_str(), "view transition settled");
    }

    /// Persist the target mode and show it.
    fn flip(&self, machine: &mut Machine) {
        let Some(target) = machine.phase.target() else {
            return;
        };
        self.session.store_view_mode(target);
        machine.phase = TransitionPhase::entering(target, Stage::FadingIn);
        self.publish(machine.phase);
    }
}

impl std::fmt::Debug for ViewTransitionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewTransitionCoordinator")
            .field("phase", &self.phase())
            .field("timing", &self.inner.timing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use capsule_telemetry::{MemorySink, TelemetryError};

    use crate::ports::MemoryStorage;

    struct FailingSink;

    impl TelemetrySink for FailingSink {
        fn emit(&self, _event: AnalyticsEvent) -> Result<(), TelemetryError> {
            Err(TelemetryError::Unavailable("offline".into()))
        }
    }

    fn coordinator(sink: Arc<dyn TelemetrySink>) -> ViewTransitionCoordinator {
        let session = Arc::new(UiSession::for_address(Arc::new(MemoryStorage::new()), "0xabc"));
        ViewTransitionCoordinator::new(session, sink, TransitionTiming::default())
    }

    async fn advance_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_phases_in_order() {
        let coordinator = coordinator(Arc::new(MemorySink::new()));
        assert!(coordinator.snapshot().is_settled_on(ViewMode::Classic));

        assert!(coordinator.toggle());
        let fading = coordinator.snapshot();
        assert!(fading.is_transitioning);
        assert!(!fading.visible_classic && !fading.visible_timeline);
        assert_eq!(coordinator.mode(), ViewMode::Classic);

        advance_ms(301).await;
        assert_eq!(
            coordinator.phase(),
            TransitionPhase::EnteringTimeCapsule(Stage::FadingIn)
        );
        assert_eq!(coordinator.mode(), ViewMode::TimeCapsule);
        let shown = coordinator.snapshot();
        assert!(shown.is_transitioning && shown.visible_timeline && !shown.visible_classic);

        advance_ms(500).await;
        assert_eq!(coordinator.phase(), TransitionPhase::TimeCapsule);
        assert!(coordinator.snapshot().is_settled_on(ViewMode::TimeCapsule));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_toggle_flips_once() {
        let sink = Arc::new(MemorySink::new());
        let coordinator = coordinator(sink.clone());

        assert!(coordinator.toggle());
        assert!(!coordinator.toggle());
        advance_ms(100).await;
        assert!(!coordinator.toggle());

        advance_ms(1_000).await;
        assert_eq!(coordinator.mode(), ViewMode::TimeCapsule);
        assert_eq!(sink.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_emits_enter_then_exit() {
        let sink = Arc::new(MemorySink::new());
        let coordinator = coordinator(sink.clone());
        coordinator.set_subject("0xabc", 3, 40);

        coordinator.toggle();
        advance_ms(900).await;
        coordinator.toggle();
        advance_ms(900).await;

        assert_eq!(coordinator.mode(), ViewMode::Classic);
        assert_eq!(
            sink.events(),
            vec![
                AnalyticsEvent::TimeCapsuleEntered {
                    address: "0xabc".into(),
                    moments_count: 3,
                    tokens_count: 40,
                },
                AnalyticsEvent::TimeCapsuleExited {
                    address: "0xabc".into()
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_telemetry_failure_is_ignored() {
        let coordinator = coordinator(Arc::new(FailingSink));
        assert!(coordinator.toggle());
        advance_ms(900).await;
        assert_eq!(coordinator.phase(), TransitionPhase::TimeCapsule);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_fade_before_show() {
        let coordinator = coordinator(Arc::new(MemorySink::new()));
        let mut rx = coordinator.subscribe();

        coordinator.toggle();
        rx.changed().await.unwrap();
        let first = *rx.borrow_and_update();
        assert!(first.is_transitioning && !first.visible_timeline);

        rx.changed().await.unwrap();
        let second = *rx.borrow_and_update();
        assert!(second.visible_timeline && second.is_transitioning);

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_settled_on(ViewMode::TimeCapsule));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_mode_ignored_mid_transition() {
        let sink = Arc::new(MemorySink::new());
        let coordinator = coordinator(sink.clone());

        assert!(coordinator.set_mode(ViewMode::TimeCapsule));
        assert!(coordinator.snapshot().is_settled_on(ViewMode::TimeCapsule));
        assert!(sink.events().is_empty());

        coordinator.toggle();
        assert!(!coordinator.set_mode(ViewMode::TimeCapsule));
        advance_ms(900).await;
        assert_eq!(coordinator.mode(), ViewMode::Classic);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_follows_persisted_mode() {
        let storage = Arc::new(MemoryStorage::new());
        crate::ports::SessionStorage::set(&*storage, "poap-time-capsule-0xabc", "true").unwrap();
        let session = Arc::new(UiSession::for_address(storage, "0xabc"));
        let coordinator = ViewTransitionCoordinator::new(
            session,
            Arc::new(MemorySink::new()),
            TransitionTiming::default(),
        );
        assert_eq!(coordinator.phase(), TransitionPhase::TimeCapsule);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_subject_resettles_visibility() {
        let sink = Arc::new(MemorySink::new());
        let coordinator = coordinator(sink.clone());
        assert!(coordinator.set_mode(ViewMode::TimeCapsule));

        coordinator.set_subject("bob.eth", 1, 5);
        assert_eq!(coordinator.mode(), ViewMode::Classic);
        assert_eq!(coordinator.phase(), TransitionPhase::Classic);
        assert!(coordinator.snapshot().is_settled_on(coordinator.mode()));

        assert!(coordinator.toggle());
        advance_ms(900).await;
        assert!(coordinator.snapshot().is_settled_on(ViewMode::TimeCapsule));
        assert_eq!(
            sink.events(),
            vec![AnalyticsEvent::TimeCapsuleEntered {
                address: "bob.eth".into(),
                moments_count: 1,
                tokens_count: 5,
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_subject_switch_mid_transition_settles_on_target() {
        let coordinator = coordinator(Arc::new(MemorySink::new()));
        assert!(coordinator.toggle());
        advance_ms(400).await;
        assert_eq!(coordinator.mode(), ViewMode::TimeCapsule);

        coordinator.set_subject("bob.eth", 0, 0);
        advance_ms(500).await;
        assert_eq!(coordinator.phase(), TransitionPhase::TimeCapsule);
        assert_eq!(coordinator.mode(), ViewMode::TimeCapsule);
        assert!(coordinator.snapshot().is_settled_on(coordinator.mode()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_pending_steps() {
        let storage = Arc::new(MemoryStorage::new());
        let session = Arc::new(UiSession::for_address(storage, "0xabc"));
        let coordinator = ViewTransitionCoordinator::new(
            session.clone(),
            Arc::new(MemorySink::new()),
            TransitionTiming::default(),
        );
        coordinator.toggle();
        drop(coordinator);

        advance_ms(1_000).await;
        assert_eq!(session.view_mode(), ViewMode::Classic);
    }
}
