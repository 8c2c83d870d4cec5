//! Client routes for a subject address.
//!
//! Every address has exactly two tabs: the collection index (`/v/{address}`)
//! and the profile (`/v/{address}/profile`). The prefetch cache keys its
//! records by the canonical route path.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Index,
    Profile,
}

impl Tab {
    /// The other tab of the same address.
    pub fn sibling(&self) -> Self {
        match self {
            Tab::Index => Tab::Profile,
            Tab::Profile => Tab::Index,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Index => "index",
            Tab::Profile => "profile",
        }
    }
}

/// A route for one tab of one address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrefetchTarget {
    pub address: String,
    pub tab: Tab,
}

impl PrefetchTarget {
    pub fn new(address: impl Into<String>, tab: Tab) -> Self {
        Self {
            address: address.into(),
            tab,
        }
    }

    pub fn index(address: impl Into<String>) -> Self {
        Self::new(address, Tab::Index)
    }

    pub fn profile(address: impl Into<String>) -> Self {
        Self::new(address, Tab::Profile)
    }

    /// Same address, other tab.
    pub fn sibling(&self) -> Self {
        Self::new(self.address.clone(), self.tab.sibling())
    }

    /// Canonical route path, the record key.
    pub fn path(&self) -> String {
        match self.tab {
            Tab::Index => format!("/v/{}", self.address),
            Tab::Profile => format!("/v/{}/profile", self.address),
        }
    }
}

impl fmt::Display for PrefetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
