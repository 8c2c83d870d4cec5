//! Session-scoped persisted UI state.
//!
//! [`UiSession`] owns the three persisted values (filter selection, sort,
//! view mode). Each one lives in session storage as JSON under its own key,
//! suffixed with the subject address once one is known:
//!
//! | Value           | Key                            | JSON shape                          |
//! |-----------------|--------------------------------|-------------------------------------|
//! | FilterSelection | `poap-filters[-{address}]`     | `{"Country": ["US"]}`               |
//! | SortSpec        | `poap-sort[-{address}]`        | `{"key": "...", "direction": "..."}` |
//! | ViewMode        | `poap-time-capsule[-{address}]`| `"time_capsule"` (or legacy `true`) |
//!
//! Reads are open to everyone. Writes are crate-private: only
//! [`CollectionViewState`](crate::CollectionViewState) writes filters and sort,
//! and only [`ViewTransitionCoordinator`](crate::ViewTransitionCoordinator)
//! writes the mode.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use capsule_types::{FilterSelection, SortSpec, ViewMode};

use crate::constants::{FILTERS_KEY, SORT_KEY, VIEW_MODE_KEY};
use crate::ports::SessionStorage;

/// Values are loaded from storage on first read.
#[derive(Debug, Default)]
struct Cached {
    filters: Option<FilterSelection>,
    sort: Option<SortSpec>,
    mode: Option<ViewMode>,
}

#[derive(Debug, Default)]
struct SessionInner {
    address: Option<String>,
    cached: Cached,
}

pub struct UiSession {
    storage: Arc<dyn SessionStorage>,
    inner: Mutex<SessionInner>,
}

impl UiSession {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            inner: Mutex::new(SessionInner::default()),
        }
    }

    /// Session for a known subject address.
    pub fn for_address(storage: Arc<dyn SessionStorage>, address: impl Into<String>) -> Self {
        let session = Self::new(storage);
        session.inner.lock().address = Some(address.into());
        session
    }

    pub fn address(&self) -> Option<String> {
        self.inner.lock().address.clone()
    }

    /// Switch the subject address.
    ///
    /// Moving away from a known address clears that address's keys and resets
    /// every value to its default. Returns whether the address changed. Only
    /// the transition coordinator calls this, so its published visibility
    /// follows the reset mode.
    pub(crate) fn set_address(&self, address: impl Into<String>) -> bool {
        let address = address.into();
        let mut inner = self.inner.lock();
        let previous = inner.address.clone();
        match previous.as_deref() {
            Some(current) if current == address => false,
            Some(previous) => {
                debug!(from = previous, to = %address, "session address switched");
                self.remove_keys(Some(previous));
                inner.address = Some(address);
                inner.cached = Cached {
                    filters: Some(FilterSelection::default()),
                    sort: Some(SortSpec::default()),
                    mode: Some(ViewMode::default()),
                };
                true
            }
            None => {
                inner.address = Some(address);
                inner.cached = Cached::default();
                true
            }
        }
    }

    pub fn filters(&self) -> FilterSelection {
        let mut inner = self.inner.lock();
        if let Some(filters) = &inner.cached.filters {
            return filters.clone();
        }
        let key = storage_key(FILTERS_KEY, inner.address.as_deref());
        let filters: FilterSelection = self.load(&key, parse_json).unwrap_or_default();
        inner.cached.filters = Some(filters.clone());
        filters
    }

    pub fn sort(&self) -> SortSpec {
        let mut inner = self.inner.lock();
        if let Some(sort) = inner.cached.sort {
            return sort;
        }
        let key = storage_key(SORT_KEY, inner.address.as_deref());
        let sort: SortSpec = self.load(&key, parse_json).unwrap_or_default();
        inner.cached.sort = Some(sort);
        sort
    }

    pub fn view_mode(&self) -> ViewMode {
        let mut inner = self.inner.lock();
        if let Some(mode) = inner.cached.mode {
            return mode;
        }
        let key = storage_key(VIEW_MODE_KEY, inner.address.as_deref());
        let mode = self.load(&key, parse_view_mode).unwrap_or_default();
        inner.cached.mode = Some(mode);
        mode
    }

    pub(crate) fn store_filters(&self, filters: FilterSelection) {
        let mut inner = self.inner.lock();
        let key = storage_key(FILTERS_KEY, inner.address.as_deref());
        self.persist(&key, &filters);
        inner.cached.filters = Some(filters);
    }

    pub(crate) fn store_sort(&self, sort: SortSpec) {
        let mut inner = self.inner.lock();
        let key = storage_key(SORT_KEY, inner.address.as_deref());
        self.persist(&key, &sort);
        inner.cached.sort = Some(sort);
    }

    pub(crate) fn store_view_mode(&self, mode: ViewMode) {
        let mut inner = self.inner.lock();
        let key = storage_key(VIEW_MODE_KEY, inner.address.as_deref());
        self.persist(&key, &mode);
        inner.cached.mode = Some(mode);
    }

    /// Remove every persisted value for the current address and forget the
    /// cache.
    pub fn end_session(&self) {
        let mut inner = self.inner.lock();
        self.remove_keys(inner.address.as_deref());
        inner.cached = Cached::default();
    }

    fn load<T>(&self, key: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "session storage read failed, using default");
                return None;
            }
        };
        let parsed = parse(&raw);
        if parsed.is_none() {
            warn!(key, raw = %raw, "malformed session value, using default");
        }
        parsed
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to encode session value");
                return;
            }
        };
        if let Err(e) = self.storage.set(key, &json) {
            warn!(key, error = %e, "session storage write failed");
        }
    }

    fn remove_keys(&self, address: Option<&str>) {
        for prefix in [FILTERS_KEY, SORT_KEY, VIEW_MODE_KEY] {
            let key = storage_key(prefix, address);
            if let Err(e) = self.storage.remove(&key) {
                warn!(key, error = %e, "session storage remove failed");
            }
        }
    }
}

impl std::fmt::Debug for UiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiSession")
            .field("inner", &*self.inner.lock())
            .finish_non_exhaustive()
    }
}

pub(crate) fn storage_key(prefix: &str, address: Option<&str>) -> String {
    match address {
        Some(address) if !address.is_empty() => format!("{prefix}-{address}"),
        _ => prefix.to_string(),
    }
}

fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(raw).ok()
}

/// Accepts the mode name or the legacy boolean.
fn parse_view_mode(raw: &str) -> Option<ViewMode> {
    match serde_json::from_str::<serde_json::Value>(raw).ok()? {
        serde_json::Value::Bool(flag) => Some(ViewMode::from(flag)),
        value => serde_json::from_value(value).ok(),
    }
}
