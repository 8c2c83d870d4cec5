//! Background warm-up of the sibling tab.
//!
//! Each address has two tabs. While one is open, the cache loads the other in
//! the background after a short delay so switching tabs does not wait on the
//! network. Per target it records what has been issued:
//!
//! - the data load: `NotIssued → InFlight → Done`, rolled back to `NotIssued`
//!   only when the load fails
//! - the module-preload and prefetch hints (advanced variant only): set once,
//!   never rolled back; the hints themselves expire after `hint_ttl`
//!
//! Scheduling replaces any pending delay rather than stacking. Dropping the
//! cache aborts every pending timer and load and removes hints that are still
//! in the document.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use capsule_types::{PrefetchTarget, Tab};

use crate::config::PrefetchConfig;
use crate::ports::{HintRel, HintSink, LoadError, LoaderState, ResourceHint, RouteLoader};
use crate::timer::ScheduledTask;

const PROFILE_MODULE_HREF: &str = "/build/routes/v.$address.profile-*.js";
const INDEX_MODULE_HREF: &str = "/build/routes/v.$address._index-*.js";

/// Route module bundle for a tab.
pub fn module_href(tab: Tab) -> &'static str {
    match tab {
        Tab::Profile => PROFILE_MODULE_HREF,
        Tab::Index => INDEX_MODULE_HREF,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataLoad {
    #[default]
    NotIssued,
    InFlight,
    Done,
}

impl DataLoad {
    pub fn is_issued(&self) -> bool {
        !matches!(self, DataLoad::NotIssued)
    }
}

/// What this cache has issued for one target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PrefetchRecord {
    pub data: DataLoad,
    pub module_hint: bool,
    pub prefetch_hint: bool,
}

#[derive(Default)]
struct CacheState {
    records: HashMap<PrefetchTarget, PrefetchRecord>,
    pending: Option<ScheduledTask>,
    loads: Vec<ScheduledTask>,
    expiries: Vec<ScheduledTask>,
    live_hints: Vec<ResourceHint>,
    last_error: Option<String>,
    shut_down: bool,
}

struct Inner {
    loader: Arc<dyn RouteLoader>,
    hints: Option<Arc<dyn HintSink>>,
    config: PrefetchConfig,
    state: Mutex<CacheState>,
}

pub struct NavigationPrefetchCache {
    inner: Arc<Inner>,
}

impl NavigationPrefetchCache {
    pub fn new(
        loader: Arc<dyn RouteLoader>,
        hints: Option<Arc<dyn HintSink>>,
        config: PrefetchConfig,
    ) -> Self {
        if config.resource_hints && hints.is_none() {
            debug!("resource hints enabled without a hint sink, hints disabled");
        }
        Self {
            inner: Arc::new(Inner {
                loader,
                hints,
                config,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Data only, short delay.
    pub fn simple(loader: Arc<dyn RouteLoader>) -> Self {
        Self::new(loader, None, PrefetchConfig::simple())
    }

    /// Data plus resource hints, longer delay.
    pub fn advanced(loader: Arc<dyn RouteLoader>, hints: Arc<dyn HintSink>) -> Self {
        Self::new(loader, Some(hints), PrefetchConfig::advanced())
    }

    pub fn config(&self) -> &PrefetchConfig {
        &self.inner.config
    }

    /// The current route changed to `current`; warm its sibling.
    ///
    /// Cancels any delay still pending from an earlier route. Does nothing if
    /// the sibling's data load was already issued. Must be called within a
    /// tokio runtime.
    pub fn schedule_prefetch(&self, current: &PrefetchTarget) {
        let sibling = current.sibling();
        let mut state = self.inner.state.lock();
        if state.shut_down {
            return;
        }
        state.pending = None;

        if state.records.get(&sibling).is_some_and(|r| r.data.is_issued()) {
            debug!(route = %sibling, "prefetch already issued");
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        state.pending = Some(ScheduledTask::after(self.inner.config.delay, async move {
            if let Some(inner) = weak.upgrade() {
                inner.fire(&weak, sibling);
            }
        }));
    }

    /// Targets whose data load has been issued and not rolled back.
    pub fn issued_targets(&self) -> Vec<PrefetchTarget> {
        let state = self.inner.state.lock();
        let mut targets: Vec<PrefetchTarget> = state
            .records
            .iter()
            .filter(|(_, record)| record.data.is_issued())
            .map(|(target, _)| target.clone())
            .collect();
        targets.sort();
        targets
    }

    pub fn record(&self, target: &PrefetchTarget) -> Option<PrefetchRecord> {
        self.inner.state.lock().records.get(target).copied()
    }

    /// Whether the loader reports a call in flight.
    pub fn is_preloading(&self) -> bool {
        self.inner.loader.state() == LoaderState::Loading
    }

    /// Message of the most recent failed background load.
    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    /// Whether a scheduling delay is waiting to fire.
    pub fn has_pending(&self) -> bool {
        self.inner
            .state
            .lock()
            .pending
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Hints inserted by this cache that have not expired yet.
    pub fn live_hints(&self) -> Vec<ResourceHint> {
        self.inner.state.lock().live_hints.clone()
    }

    /// Cancel every timer and load, and remove hints still in the document.
    ///
    /// Idempotent. Later `schedule_prefetch` calls are ignored.
    pub fn shutdown(&self) {
        self.inner.release();
    }
}

impl Drop for NavigationPrefetchCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// Loader and hint sink calls are made with `state` unlocked, so a host
// implementation may call back into the cache.
impl Inner {
    fn fire(&self, weak: &Weak<Inner>, target: PrefetchTarget) {
        if self.loader.state() == LoaderState::Loading {
            debug!(route = %target, "loader busy, skipping prefetch");
            return;
        }

        let wanted = {
            let mut state = self.state.lock();
            if state.shut_down {
                return;
            }
            let record = state.records.entry(target.clone()).or_default();
            if record.data.is_issued() {
                return;
            }
            record.data = DataLoad::InFlight;
            info!(route = %target, "prefetching sibling route");

            if self.config.resource_hints && self.hints.is_some() {
                claim_hints(record, &target)
            } else {
                Vec::new()
            }
        };

        if let Some(sink) = &self.hints {
            self.insert_hints(weak, sink.as_ref(), wanted);
        }

        let loader = Arc::clone(&self.loader);
        let weak = weak.clone();
        let load = ScheduledTask::spawn(async move {
            let result = loader.load(&target).await;
            if let Some(inner) = weak.upgrade() {
                inner.finish_load(target, result);
            }
        });
        let mut state = self.state.lock();
        if !state.shut_down {
            state.loads.retain(|task| !task.is_finished());
            state.loads.push(load);
        }
    }

    fn finish_load(&self, target: PrefetchTarget, result: Result<(), LoadError>) {
        let mut state = self.state.lock();
        match result {
            Ok(()) => {
                debug!(route = %target, "prefetch complete");
                state.records.entry(target).or_default().data = DataLoad::Done;
            }
            Err(e) => {
                warn!(route = %target, error = %e, "prefetch failed, will retry on next schedule");
                state.records.entry(target).or_default().data = DataLoad::NotIssued;
                state.last_error = Some(e.to_string());
            }
        }
    }

    /// Insert each hint and arm its expiry. A failed insert is logged and
    /// leaves the record's flag set.
    fn insert_hints(&self, weak: &Weak<Inner>, sink: &dyn HintSink, wanted: Vec<ResourceHint>) {
        for hint in wanted {
            if let Err(e) = sink.insert(&hint) {
                warn!(hint = %hint, error = %e, "resource hint insertion failed");
                continue;
            }
            debug!(hint = %hint, "resource hint inserted");

            let expiry = ScheduledTask::after(self.config.hint_ttl, {
                let weak = weak.clone();
                let hint = hint.clone();
                async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.expire(&hint);
                    }
                }
            });

            let mut state = self.state.lock();
            if state.shut_down {
                drop(state);
                remove_if_present(sink, &hint);
                continue;
            }
            state.live_hints.push(hint);
            state.expiries.retain(|task| !task.is_finished());
            state.expiries.push(expiry);
        }
    }

    fn expire(&self, hint: &ResourceHint) {
        self.state.lock().live_hints.retain(|live| live != hint);
        if let Some(sink) = &self.hints {
            remove_if_present(sink.as_ref(), hint);
        }
    }

    fn release(&self) {
        let hints = {
            let mut state = self.state.lock();
            if !state.shut_down {
                debug!(hints = state.live_hints.len(), "prefetch cache shutting down");
            }
            state.shut_down = true;
            state.pending = None;
            state.loads.clear();
            state.expiries.clear();
            std::mem::take(&mut state.live_hints)
        };
        if let Some(sink) = &self.hints {
            for hint in &hints {
                remove_if_present(sink.as_ref(), hint);
            }
        }
    }
}

/// Set the hint flags not yet set and return the hints they stand for.
fn claim_hints(record: &mut PrefetchRecord, target: &PrefetchTarget) -> Vec<ResourceHint> {
    let mut wanted = Vec::with_capacity(2);
    if !record.module_hint {
        record.module_hint = true;
        wanted.push(ResourceHint::new(HintRel::ModulePreload, module_href(target.tab)));
    }
    if !record.prefetch_hint {
        record.prefetch_hint = true;
        wanted.push(ResourceHint::new(HintRel::Prefetch, target.path()));
    }
    wanted
}

fn remove_if_present(sink: &dyn HintSink, hint: &ResourceHint) {
    if !sink.contains(hint) {
        return;
    }
    if let Err(e) = sink.remove(hint) {
        warn!(hint = %hint, error = %e, "resource hint removal failed");
    }
}
