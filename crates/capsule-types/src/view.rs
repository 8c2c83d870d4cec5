//! Presentation mode and the ephemeral visibility flags of a mode switch.

use serde::{Deserialize, Serialize};

/// Which presentation of the collection is active.
///
/// Time Capsule is a different rendering of the same collection, not a filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Grid of token cards.
    #[default]
    Classic,
    /// Timeline of moments.
    TimeCapsule,
}

impl ViewMode {
    pub fn is_time_capsule(&self) -> bool {
        matches!(self, ViewMode::TimeCapsule)
    }

    /// The other mode.
    pub fn toggled(&self) -> Self {
        match self {
            ViewMode::Classic => ViewMode::TimeCapsule,
            ViewMode::TimeCapsule => ViewMode::Classic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Classic => "classic",
            ViewMode::TimeCapsule => "time_capsule",
        }
    }
}

impl From<bool> for ViewMode {
    /// `true` means Time Capsule, matching the legacy persisted boolean.
    fn from(time_capsule: bool) -> Self {
        if time_capsule {
            ViewMode::TimeCapsule
        } else {
            ViewMode::Classic
        }
    }
}

/// Visibility flags rendering consumers read during a mode switch.
///
/// Never persisted. While a transition fades out, neither presentation is
/// visible; once it settles, exactly the presentation matching the mode is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionState {
    pub is_transitioning: bool,
    pub visible_classic: bool,
    pub visible_timeline: bool,
}

impl TransitionState {
    /// Settled state for a mode: not transitioning, only that mode visible.
    pub fn settled(mode: ViewMode) -> Self {
        Self {
            is_transitioning: false,
            visible_classic: mode == ViewMode::Classic,
            visible_timeline: mode == ViewMode::TimeCapsule,
        }
    }

    /// Whether the visible flags agree with `mode` and nothing is in flight.
    pub fn is_settled_on(&self, mode: ViewMode) -> bool {
        *self == Self::settled(mode)
    }
}

impl Default for TransitionState {
    fn default() -> Self {
        Self::settled(ViewMode::default())
    }
}
