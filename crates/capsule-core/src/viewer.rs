//! One viewer page, wired from a [`CapsuleConfig`].

use std::sync::Arc;

use capsule_telemetry::TelemetrySink;
use capsule_types::{MomentsIndex, PrefetchTarget};

use crate::auto_activation::AutoActivationTrigger;
use crate::config::CapsuleConfig;
use crate::pagination::{PaginationWindow, Reveal};
use crate::ports::{HintSink, NavigationSignals, RouteLoader, SessionStorage};
use crate::prefetch::NavigationPrefetchCache;
use crate::session::UiSession;
use crate::transition::ViewTransitionCoordinator;
use crate::url_state::UrlState;
use crate::view_state::{Collection, CollectionViewState, DerivedList};

/// Host-provided collaborators.
pub struct Ports {
    pub storage: Arc<dyn SessionStorage>,
    pub loader: Arc<dyn RouteLoader>,
    pub hints: Option<Arc<dyn HintSink>>,
    pub navigation: Arc<dyn NavigationSignals>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

/// Everything a collection page owns. Dropping it cancels every timer.
pub struct Viewer {
    pub session: Arc<UiSession>,
    pub view_state: CollectionViewState,
    pub transitions: ViewTransitionCoordinator,
    pub auto_activation: AutoActivationTrigger,
    pub prefetch: NavigationPrefetchCache,
    pub pagination: PaginationWindow,
    moments: MomentsIndex,
    derived: Option<DerivedList>,
}

impl Viewer {
    /// Must be called within a tokio runtime.
    pub fn new(config: &CapsuleConfig, address: impl Into<String>, ports: Ports) -> Self {
        let session = Arc::new(UiSession::for_address(ports.storage, address));
        let transitions = ViewTransitionCoordinator::new(
            session.clone(),
            ports.telemetry,
            config.transition,
        );
        let auto_activation = AutoActivationTrigger::new(
            transitions.clone(),
            ports.navigation,
            config.auto_activation.delay,
        );
        Self {
            view_state: CollectionViewState::new(session.clone()),
            prefetch: NavigationPrefetchCache::new(ports.loader, ports.hints, config.prefetch),
            pagination: PaginationWindow::new(config.pagination.page_size),
            session,
            transitions,
            auto_activation,
            moments: MomentsIndex::new(),
            derived: None,
        }
    }

    /// Apply state carried by the landing URL.
    pub fn init_from_url(&self, url: &UrlState) {
        self.view_state.apply_url_state(url);
        if url.time_capsule {
            self.transitions.set_mode(url.view_mode());
        }
    }

    /// The route changed: warm the sibling tab.
    pub fn navigated(&self, current: &PrefetchTarget) {
        self.prefetch.schedule_prefetch(current);
    }

    /// A collection (and its moments index) arrived.
    pub fn load_collection(&mut self, collection: &Collection, moments: MomentsIndex) {
        let moments_count = moments.len() as u64;
        let address = self.session.address().unwrap_or_default();
        self.transitions
            .set_subject(address, moments_count, collection.len() as u64);
        self.moments = moments;
        self.refresh(collection);
        self.auto_activation.evaluate(moments_count);
    }

    /// Re-derive after a filter or sort change.
    ///
    /// The pagination window is re-keyed here, so growing it right after a
    /// change applies to the new list.
    pub fn refresh(&mut self, collection: &Collection) {
        let derived = self.view_state.derive(collection, &self.moments);
        self.pagination.sync(derived.identity, derived.len());
        self.derived = Some(derived);
    }

    /// Visible rows of the current derived list.
    pub fn visible(&mut self) -> Option<Reveal<'_, capsule_types::CollectionItem>> {
        let derived = self.derived.as_ref()?;
        Some(self.pagination.reveal(derived.identity, &derived.items))
    }

    pub fn derived(&self) -> Option<&DerivedList> {
        self.derived.as_ref()
    }

    /// Current state as shareable query pairs.
    pub fn url_state(&self) -> UrlState {
        UrlState::new(
            self.view_state.filters(),
            self.view_state.sort(),
            self.transitions.mode(),
        )
    }
}
