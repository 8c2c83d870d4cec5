//! Analytics event vocabulary.

use std::collections::BTreeMap;

use serde::Serialize;

/// A product analytics event.
///
/// Event names are stable strings shared with the dashboard; do not rename.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    /// The viewer switched from Classic into Time Capsule.
    TimeCapsuleEntered {
        address: String,
        moments_count: u64,
        tokens_count: u64,
    },
    /// The viewer switched from Time Capsule back to Classic.
    TimeCapsuleExited { address: String },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AnalyticsEvent::TimeCapsuleEntered { .. } => "Time Capsule Enter",
            AnalyticsEvent::TimeCapsuleExited { .. } => "Time Capsule Exit",
        }
    }

    pub fn address(&self) -> &str {
        match self {
            AnalyticsEvent::TimeCapsuleEntered { address, .. }
            | AnalyticsEvent::TimeCapsuleExited { address } => address,
        }
    }

    /// Flat property map in the analytics backend's naming.
    pub fn properties(&self) -> BTreeMap<&'static str, String> {
        let mut props = BTreeMap::new();
        match self {
            AnalyticsEvent::TimeCapsuleEntered {
                address,
                moments_count,
                tokens_count,
            } => {
                props.insert("address", address.clone());
                props.insert("momentsCount", moments_count.to_string());
                props.insert("poapsCount", tokens_count.to_string());
            }
            AnalyticsEvent::TimeCapsuleExited { address } => {
                props.insert("address", address.clone());
            }
        }
        props
    }
}
