//! Index of drops known to have at least one moment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Drop ids with at least one moment (media attachment).
///
/// Supplied once per rendering session by the moments provider and treated as
/// authoritative; the core never recomputes it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MomentsIndex {
    drops: HashSet<u64>,
}

impl MomentsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, drop_id: u64) -> bool {
        self.drops.contains(&drop_id)
    }

    /// 1 when the drop has moments, else 0. The moments-count sort key.
    pub fn moments_flag(&self, drop_id: u64) -> u8 {
        u8::from(self.contains(drop_id))
    }

    pub fn len(&self) -> usize {
        self.drops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }
}

impl FromIterator<u64> for MomentsIndex {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            drops: iter.into_iter().collect(),
        }
    }
}
