//! End-to-end flows through a wired [`Viewer`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use capsule_core::constants::AUTO_ACTIVATION_PARAM;
use capsule_core::{
    CapsuleConfig, Collection, LoadError, LoaderState, MemoryNavigation, MemoryStorage,
    NavigationSignals, Ports, RouteLoader, SessionStorage, UrlState, Viewer,
};
use capsule_telemetry::{AnalyticsEvent, MemorySink};
use capsule_types::{
    CollectionItem, Event, FilterCategory, MomentsIndex, PrefetchTarget, SortKey, SortSpec,
    ViewMode,
};

// ============================================================================
// Shared test setup
// ============================================================================

#[derive(Default)]
struct RecordingLoader {
    loads: parking_lot::Mutex<Vec<String>>,
    in_flight: AtomicUsize,
}

#[async_trait]
impl RouteLoader for RecordingLoader {
    fn state(&self) -> LoaderState {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            LoaderState::Loading
        } else {
            LoaderState::Idle
        }
    }

    async fn load(&self, target: &PrefetchTarget) -> Result<(), LoadError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.loads.lock().push(target.path());
        tokio::time::sleep(Duration::from_millis(200)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    storage: Arc<MemoryStorage>,
    loader: Arc<RecordingLoader>,
    navigation: Arc<MemoryNavigation>,
    telemetry: Arc<MemorySink>,
}

impl Harness {
    fn new() -> Self {
        capsule_telemetry::init_tracing("warn");
        Self {
            storage: Arc::new(MemoryStorage::new()),
            loader: Arc::new(RecordingLoader::default()),
            navigation: Arc::new(MemoryNavigation::new()),
            telemetry: Arc::new(MemorySink::new()),
        }
    }

    fn viewer(&self, config: &CapsuleConfig) -> Viewer {
        Viewer::new(
            config,
            "0xabc",
            Ports {
                storage: self.storage.clone(),
                loader: self.loader.clone(),
                hints: None,
                navigation: self.navigation.clone(),
                telemetry: self.telemetry.clone(),
            },
        )
    }
}

fn collection(n: usize) -> Collection {
    let countries = ["US", "US", "FR", "", "DE"];
    let items: Vec<CollectionItem> = (0..n)
        .map(|i| {
            CollectionItem::new(
                i.to_string(),
                Event::new(i as u64, format!("drop {i}"))
                    .with_country(countries[i % countries.len()])
                    .with_supply((i as u64 * 7) % 13),
            )
        })
        .collect();
    Collection::new(items)
}

async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// ============================================================================
// Collection derivation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn filter_then_paginate() {
    let harness = Harness::new();
    let mut viewer = harness.viewer(&CapsuleConfig::default());
    let collection = collection(5);
    viewer.load_collection(&collection, MomentsIndex::new());

    viewer.view_state.set_filter(FilterCategory::Country, ["US"]);
    viewer.refresh(&collection);

    let visible = viewer.visible().unwrap();
    let ids: Vec<&str> = visible.displayed.iter().map(|i| i.token_id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1"]);
    assert!(!visible.has_more);
}

#[tokio::test(start_paused = true)]
async fn narrowing_the_list_resets_the_window() {
    let harness = Harness::new();
    let mut viewer = harness.viewer(&CapsuleConfig::default());
    let collection = collection(500);
    viewer.load_collection(&collection, MomentsIndex::new());

    assert_eq!(viewer.visible().unwrap().displayed.len(), 60);
    viewer.pagination.grow_by(60);
    viewer.pagination.grow_by(60);
    viewer.pagination.grow_by(60);
    assert_eq!(viewer.visible().unwrap().displayed.len(), 240);

    // 100 FR items.
    viewer.view_state.set_filter(FilterCategory::Country, ["FR"]);
    viewer.refresh(&collection);
    let visible = viewer.visible().unwrap();
    assert_eq!(visible.displayed.len(), 60);
    assert!(visible.has_more);

    viewer.view_state.set_sort(SortSpec::asc(SortKey::Popularity));
    viewer.refresh(&collection);
    viewer.pagination.grow_by(60);
    let visible = viewer.visible().unwrap();
    assert_eq!(visible.displayed.len(), 100);
    assert!(!visible.has_more);
}

#[tokio::test(start_paused = true)]
async fn growing_right_after_a_change_uses_the_new_list() {
    let harness = Harness::new();
    let mut viewer = harness.viewer(&CapsuleConfig::default());
    let collection = collection(500);
    viewer.load_collection(&collection, MomentsIndex::new());
    viewer.pagination.grow_by(60);

    // 200 US items; no render between the change and the grow.
    viewer.view_state.set_filter(FilterCategory::Country, ["US"]);
    viewer.refresh(&collection);
    assert_eq!(viewer.pagination.displayed_len(), 60);
    assert!(viewer.pagination.grow_by(60));

    let visible = viewer.visible().unwrap();
    assert_eq!(visible.displayed.len(), 120);
    assert!(visible.has_more);
}

#[tokio::test(start_paused = true)]
async fn filters_and_sort_survive_tab_switch() {
    let harness = Harness::new();
    {
        let viewer = harness.viewer(&CapsuleConfig::default());
        viewer.view_state.set_filter(FilterCategory::Year, ["2023"]);
        viewer.view_state.set_sort(SortSpec::desc(SortKey::MomentsCount));
    }

    let viewer = harness.viewer(&CapsuleConfig::default());
    assert!(viewer.view_state.filters().accepts(FilterCategory::Year, "2023"));
    assert_eq!(viewer.view_state.sort(), SortSpec::desc(SortKey::MomentsCount));
    assert!(harness.storage.get("poap-sort-0xabc").unwrap().is_some());
}

// ============================================================================
// Navigation and mode switches
// ============================================================================

#[tokio::test(start_paused = true)]
async fn tab_switches_prefetch_each_sibling_once() {
    let harness = Harness::new();
    let config =
        CapsuleConfig::from_ron("(prefetch: (delay_ms: 1000, resource_hints: false))").unwrap();
    let viewer = harness.viewer(&config);

    viewer.navigated(&PrefetchTarget::index("0xabc"));
    advance_ms(1_500).await;
    viewer.navigated(&PrefetchTarget::profile("0xabc"));
    advance_ms(1_500).await;
    viewer.navigated(&PrefetchTarget::index("0xabc"));
    advance_ms(1_500).await;
    viewer.navigated(&PrefetchTarget::profile("0xabc"));
    advance_ms(1_500).await;

    assert_eq!(
        *harness.loader.loads.lock(),
        vec!["/v/0xabc/profile".to_string(), "/v/0xabc".to_string()]
    );
    assert_eq!(viewer.prefetch.issued_targets().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn auto_activation_link_opens_time_capsule() {
    let harness = Harness::new();
    harness.navigation.set_param(AUTO_ACTIVATION_PARAM, "true");
    let mut viewer = harness.viewer(&CapsuleConfig::default());

    let moments: MomentsIndex = [1, 2].into_iter().collect();
    viewer.load_collection(&collection(10), moments);
    assert_eq!(harness.navigation.query_param(AUTO_ACTIVATION_PARAM), None);

    advance_ms(2_000 + 800 + 10).await;
    assert_eq!(viewer.transitions.mode(), ViewMode::TimeCapsule);
    assert!(viewer.transitions.snapshot().is_settled_on(ViewMode::TimeCapsule));
    assert_eq!(
        harness.telemetry.events(),
        vec![AnalyticsEvent::TimeCapsuleEntered {
            address: "0xabc".into(),
            moments_count: 2,
            tokens_count: 10,
        }]
    );
    assert_eq!(viewer.url_state().to_query(), "timeCapsule=true");
}

#[tokio::test(start_paused = true)]
async fn leaving_the_page_cancels_auto_activation() {
    let harness = Harness::new();
    harness.navigation.set_param(AUTO_ACTIVATION_PARAM, "true");
    let mut viewer = harness.viewer(&CapsuleConfig::default());
    viewer.load_collection(&collection(3), [0].into_iter().collect());
    let transitions = viewer.transitions.clone();
    drop(viewer);

    advance_ms(10_000).await;
    assert_eq!(transitions.mode(), ViewMode::Classic);
    assert!(harness.telemetry.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn shared_link_initializes_state() {
    let harness = Harness::new();
    let viewer = harness.viewer(&CapsuleConfig::default());
    let url = UrlState::from_query("filter_Country=FR&sort=most_popular&timeCapsule=true");
    viewer.init_from_url(&url);

    assert!(viewer.view_state.filters().accepts(FilterCategory::Country, "FR"));
    assert_eq!(viewer.view_state.sort(), SortSpec::desc(SortKey::Popularity));
    assert_eq!(viewer.transitions.mode(), ViewMode::TimeCapsule);
    assert!(harness.telemetry.events().is_empty());
}
