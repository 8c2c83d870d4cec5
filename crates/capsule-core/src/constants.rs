//! Default timings and sizes.
//!
//! These are tuning values. The one ordering that matters is that the fade-out
//! delay is strictly shorter than the total transition delay;
//! [`CapsuleConfig::validate`](crate::CapsuleConfig::validate) enforces it for
//! loaded configs.

use std::time::Duration;

/// Items revealed per page of the collection grid.
pub const DEFAULT_PAGE_SIZE: usize = 60;

/// Delay before the simple prefetch variant loads the sibling tab.
pub const SIMPLE_PREFETCH_DELAY: Duration = Duration::from_millis(1_000);

/// Delay before the advanced prefetch variant loads the sibling tab and
/// inserts its resource hints.
pub const ADVANCED_PREFETCH_DELAY: Duration = Duration::from_millis(2_000);

/// Lifetime of an inserted resource hint.
pub const RESOURCE_HINT_TTL: Duration = Duration::from_secs(60);

/// Time the outgoing presentation has to fade out before the mode flips.
pub const TRANSITION_FADE_OUT: Duration = Duration::from_millis(300);

/// Time from the start of a switch until it is no longer transitioning.
pub const TRANSITION_TOTAL: Duration = Duration::from_millis(800);

/// Delay between an accepted auto-activation request and the toggle.
pub const AUTO_ACTIVATION_DELAY: Duration = Duration::from_millis(2_000);

/// Query parameter requesting a one-shot switch into Time Capsule.
pub const AUTO_ACTIVATION_PARAM: &str = "auto_time_capsule";

/// Session storage key prefixes. Suffixed with `-{address}` once known.
pub const FILTERS_KEY: &str = "poap-filters";
pub const SORT_KEY: &str = "poap-sort";
pub const VIEW_MODE_KEY: &str = "poap-time-capsule";
