//! The filter/sort owner and the lists it derives.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use capsule_types::{CollectionItem, FilterCategory, FilterSelection, MomentsIndex, SortSpec};

use crate::engine;
use crate::session::UiSession;
use crate::url_state::UrlState;

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// A fetched collection, immutable and tagged with a process-unique revision.
///
/// Two `Collection`s built from the same items are still different lists for
/// pagination purposes: a refetch starts from the first page.
#[derive(Clone, Debug)]
pub struct Collection {
    revision: u64,
    items: Arc<[CollectionItem]>,
}

impl Collection {
    pub fn new(items: impl Into<Arc<[CollectionItem]>>) -> Self {
        Self {
            revision: NEXT_REVISION.fetch_add(1, Ordering::Relaxed),
            items: items.into(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Identity of a derived list: base collection revision plus a fingerprint of
/// the filter and sort that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListIdentity {
    collection: u64,
    fingerprint: u64,
}

impl ListIdentity {
    fn derive(collection: &Collection, filters: &FilterSelection, sort: SortSpec) -> Self {
        let mut hasher = DefaultHasher::new();
        filters.hash(&mut hasher);
        sort.hash(&mut hasher);
        Self {
            collection: collection.revision,
            fingerprint: hasher.finish(),
        }
    }

    /// Identity for a list produced outside the engine.
    pub fn from_raw(raw: u64) -> Self {
        Self {
            collection: raw,
            fingerprint: 0,
        }
    }
}

/// A filtered, sorted view of a collection.
#[derive(Clone, Debug)]
pub struct DerivedList {
    pub identity: ListIdentity,
    pub items: Vec<CollectionItem>,
}

impl DerivedList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Sole writer of the persisted filter selection and sort.
#[derive(Debug, Clone)]
pub struct CollectionViewState {
    session: Arc<UiSession>,
}

impl CollectionViewState {
    pub fn new(session: Arc<UiSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<UiSession> {
        &self.session
    }

    pub fn filters(&self) -> FilterSelection {
        self.session.filters()
    }

    pub fn sort(&self) -> SortSpec {
        self.session.sort()
    }

    /// Replace one category's accepted values. Empty values deactivate it.
    pub fn set_filter<I, S>(&self, category: FilterCategory, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filters = self.session.filters();
        filters.set_values(category, values);
        debug!(%category, active = filters.active_count(), "filter changed");
        self.session.store_filters(filters);
    }

    pub fn remove_filter_value(&self, category: FilterCategory, value: &str) -> bool {
        let mut filters = self.session.filters();
        let removed = filters.remove_value(category, value);
        if removed {
            self.session.store_filters(filters);
        }
        removed
    }

    pub fn clear_filters(&self) {
        self.session.store_filters(FilterSelection::default());
    }

    /// Replace the whole selection at once.
    pub fn replace_filters(&self, filters: FilterSelection) {
        self.session.store_filters(filters);
    }

    pub fn set_sort(&self, sort: SortSpec) {
        debug!(sort = %sort.to_param(), "sort changed");
        self.session.store_sort(sort);
    }

    pub fn reset_sort(&self) {
        self.session.store_sort(SortSpec::default());
    }

    /// Clear filters and restore the default sort.
    pub fn reset_all(&self) {
        self.clear_filters();
        self.reset_sort();
    }

    /// Adopt the filters and sort carried by a shared link.
    ///
    /// Only values the link actually carries are applied.
    pub fn apply_url_state(&self, url: &UrlState) {
        if url.filters.has_active() {
            self.replace_filters(url.filters.clone());
        }
        if let Some(sort) = url.sort {
            self.set_sort(sort);
        }
    }

    /// Filter then sort `collection` with the current selection.
    pub fn derive(&self, collection: &Collection, moments: &MomentsIndex) -> DerivedList {
        let filters = self.session.filters();
        let sort = self.session.sort();
        DerivedList {
            identity: ListIdentity::derive(collection, &filters, sort),
            items: engine::apply(collection.items(), &filters, sort, moments),
        }
    }
}
