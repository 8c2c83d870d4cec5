//! Collaborator seams.
//!
//! The core never talks to the network, the document, or the browser history
//! directly. Hosts implement these traits; tests use in-memory fakes.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use capsule_types::PrefetchTarget;

// ── Background route loader ─────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("route load failed for {target}: {message}")]
    Failed { target: String, message: String },

    #[error("loader unavailable")]
    Unavailable,
}

/// Whether the loader has a call in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoaderState {
    #[default]
    Idle,
    Loading,
}

/// Loads a route's data in the background so a later navigation is warm.
#[async_trait]
pub trait RouteLoader: Send + Sync {
    /// Current state. Advisory: the prefetch cache skips a round when busy.
    fn state(&self) -> LoaderState;

    async fn load(&self, target: &PrefetchTarget) -> Result<(), LoadError>;
}

// ── Resource hints ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum HintError {
    #[error("document unavailable")]
    DocumentUnavailable,

    #[error("hint not present: {0}")]
    NotPresent(String),
}

/// Link relation of a resource hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HintRel {
    /// `<link rel="modulepreload" as="script">`
    ModulePreload,
    /// `<link rel="prefetch">`
    Prefetch,
}

impl HintRel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HintRel::ModulePreload => "modulepreload",
            HintRel::Prefetch => "prefetch",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHint {
    pub rel: HintRel,
    pub href: String,
}

impl ResourceHint {
    pub fn new(rel: HintRel, href: impl Into<String>) -> Self {
        Self {
            rel,
            href: href.into(),
        }
    }
}

impl fmt::Display for ResourceHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rel.as_str(), self.href)
    }
}

/// Inserts and removes document-level resource hints.
pub trait HintSink: Send + Sync {
    fn insert(&self, hint: &ResourceHint) -> Result<(), HintError>;

    fn remove(&self, hint: &ResourceHint) -> Result<(), HintError>;

    fn contains(&self, hint: &ResourceHint) -> bool;
}

// ── Navigation signals ──────────────────────────────────────────────────────

/// Query parameters of the current route, rewritable without navigating.
pub trait NavigationSignals: Send + Sync {
    fn query_param(&self, name: &str) -> Option<String>;

    /// Remove a parameter in place (history replace, not push).
    fn remove_query_param(&self, name: &str);
}

/// In-memory query string, for hosts without a history API and for tests.
#[derive(Debug, Default)]
pub struct MemoryNavigation {
    params: Mutex<BTreeMap<String, String>>,
    rewrites: Mutex<usize>,
}

impl MemoryNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_param(name, value);
        self
    }

    pub fn set_param(&self, name: impl Into<String>, value: impl Into<String>) {
        self.params.lock().insert(name.into(), value.into());
    }

    /// Number of in-place rewrites performed so far.
    pub fn rewrites(&self) -> usize {
        *self.rewrites.lock()
    }
}

impl NavigationSignals for MemoryNavigation {
    fn query_param(&self, name: &str) -> Option<String> {
        self.params.lock().get(name).cloned()
    }

    fn remove_query_param(&self, name: &str) {
        if self.params.lock().remove(name).is_some() {
            *self.rewrites.lock() += 1;
        }
    }
}

// ── Session storage ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,

    #[error("storage quota exceeded writing {0}")]
    QuotaExceeded(String),
}

/// Session-scoped string key/value store.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}
