//! Client core of the capsule collection viewer.
//!
//! Decides what the collection page renders and what it fetches ahead of
//! time. Nothing here talks to the network or the document directly; hosts
//! plug in the collaborator traits from [`ports`].
//!
//! ## Module Structure
//!
//! - `engine`: filter and sort of a fetched collection
//! - `options`: selectable filter values per category
//! - `pagination`: incremental reveal of a derived list
//! - `session`: session-scoped persisted filters, sort and view mode
//! - `view_state`: the filter/sort owner and derived lists
//! - `url_state`: shareable query parameters
//! - `transition`: animated Classic ↔ Time Capsule switches
//! - `auto_activation`: one-shot switch requested by a link
//! - `prefetch`: background warm-up of the sibling tab
//! - `viewer`: everything above wired from a [`CapsuleConfig`]

pub mod auto_activation;
pub mod config;
pub mod constants;
pub mod engine;
pub mod options;
pub mod pagination;
pub mod ports;
pub mod prefetch;
pub mod session;
pub mod timer;
pub mod transition;
pub mod url_state;
pub mod view_state;
pub mod viewer;

pub use auto_activation::{AutoActivationTrigger, TriggerState};
pub use config::{
    AutoActivationConfig, CapsuleConfig, ConfigError, PaginationConfig, PrefetchConfig,
    TransitionTiming,
};
pub use options::{FilterGroup, FilterOption, filter_groups, options_for};
pub use pagination::{PaginationWindow, Reveal};
pub use ports::{
    HintError, HintRel, HintSink, LoadError, LoaderState, MemoryNavigation, MemoryStorage,
    NavigationSignals, ResourceHint, RouteLoader, SessionStorage, StorageError,
};
pub use prefetch::{DataLoad, NavigationPrefetchCache, PrefetchRecord};
pub use session::UiSession;
pub use timer::ScheduledTask;
pub use transition::{Stage, Subject, TransitionPhase, ViewTransitionCoordinator};
pub use url_state::UrlState;
pub use view_state::{Collection, CollectionViewState, DerivedList, ListIdentity};
pub use viewer::{Ports, Viewer};
