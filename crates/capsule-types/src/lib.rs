//! Shared data types for the capsule viewer.
//!
//! This crate is the leaf of the workspace: collection items as they arrive
//! from the attendance-token registry, the filter and sort selections a viewer
//! applies to them, the presentation mode, and the navigation targets that the
//! prefetch cache warms. It has **no internal capsule dependencies** and does
//! no I/O.
//!
//! # Key Types
//!
//! |-----------------------|----------------------------------------------|
//! | Type                  | Purpose                                      |
//! |-----------------------|----------------------------------------------|
//! | [`CollectionItem`]    | One collected token (immutable once fetched) |
//! | [`Event`]             | The drop a token belongs to                  |
//! | [`FilterSelection`]   | Category → accepted values                   |
//! | [`SortSpec`]          | Active sort key + direction                  |
//! | [`ViewMode`]          | Classic grid or Time Capsule timeline        |
//! | [`TransitionState`]   | Ephemeral visibility flags during a switch   |
//! | [`PrefetchTarget`]    | Address + tab, the prefetch cache key        |
//! | [`MomentsIndex`]      | Drop ids known to have at least one moment   |
//! |-----------------------|----------------------------------------------|

pub mod filter;
pub mod item;
pub mod moments;
pub mod route;
pub mod sort;
pub mod view;

pub use filter::{FilterCategory, FilterSelection, HAS_MOMENTS, NO_MOMENTS};
pub use item::{CollectionItem, DEFAULT_CHAIN, Event, NONE_PLACEHOLDER, parse_timestamp};
pub use moments::MomentsIndex;
pub use route::{PrefetchTarget, Tab};
pub use sort::{SortDirection, SortKey, SortSpec};
pub use view::{TransitionState, ViewMode};
