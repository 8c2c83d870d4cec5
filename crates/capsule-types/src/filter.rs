//! Filter categories and the viewer's current filter selection.
//!
//! A [`FilterSelection`] maps a category to the set of values it accepts. A
//! category with no accepted values is inactive, exactly like a category that
//! is absent. The persisted JSON shape is a plain object of arrays:
//!
//! ```json
//! { "Country": ["France", "US"], "Moments": ["has_moments"] }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Moments filter value selecting drops with at least one moment.
pub const HAS_MOMENTS: &str = "has_moments";

/// Moments filter value selecting drops without moments.
pub const NO_MOMENTS: &str = "no_moments";

/// A filterable facet of a collection item.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum FilterCategory {
    Country,
    City,
    Year,
    Chain,
    Moments,
}

impl FilterCategory {
    /// Every category, in display order.
    pub const ALL: [FilterCategory; 5] = [
        FilterCategory::Country,
        FilterCategory::City,
        FilterCategory::Year,
        FilterCategory::Chain,
        FilterCategory::Moments,
    ];

    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Display name, also the persisted and URL key.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCategory::Country => "Country",
            FilterCategory::City => "City",
            FilterCategory::Year => "Year",
            FilterCategory::Chain => "Chain",
            FilterCategory::Moments => "Moments",
        }
    }
}

impl std::fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category → accepted values.
///
/// Only active categories are stored: setting an empty value set removes the
/// category. Value order is irrelevant, so values are kept sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct FilterSelection {
    categories: BTreeMap<FilterCategory, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_values`](Self::set_values).
    pub fn with<I, S>(mut self, category: FilterCategory, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_values(category, values);
        self
    }

    /// Replace the accepted values of a category. Empty input deactivates it.
    pub fn set_values<I, S>(&mut self, category: FilterCategory, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            self.categories.remove(&category);
        } else {
            self.categories.insert(category, values);
        }
    }

    /// Drop a single accepted value. Returns whether it was present.
    pub fn remove_value(&mut self, category: FilterCategory, value: &str) -> bool {
        let Some(values) = self.categories.get_mut(&category) else {
            return false;
        };
        let removed = values.remove(value);
        if values.is_empty() {
            self.categories.remove(&category);
        }
        removed
    }

    /// Deactivate every category.
    pub fn clear(&mut self) {
        self.categories.clear();
    }

    /// Accepted values of a category, `None` when inactive.
    pub fn values(&self, category: FilterCategory) -> Option<&BTreeSet<String>> {
        self.categories.get(&category)
    }

    /// Whether a specific value is accepted.
    pub fn accepts(&self, category: FilterCategory, value: &str) -> bool {
        self.categories
            .get(&category)
            .is_some_and(|values| values.contains(value))
    }

    /// True when at least one category is active.
    pub fn has_active(&self) -> bool {
        !self.categories.is_empty()
    }

    /// Total accepted values across all categories.
    pub fn active_count(&self) -> usize {
        self.categories.values().map(BTreeSet::len).sum()
    }

    /// Active categories with their accepted values, in category order.
    pub fn active_categories(&self) -> impl Iterator<Item = (FilterCategory, &BTreeSet<String>)> {
        self.categories.iter().map(|(category, values)| (*category, values))
    }
}

impl From<BTreeMap<String, Vec<String>>> for FilterSelection {
    /// Unknown category names are dropped rather than rejected.
    fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
        let mut selection = FilterSelection::new();
        for (name, values) in raw {
            if let Some(category) = FilterCategory::from_str(&name) {
                selection.set_values(category, values);
            }
        }
        selection
    }
}

impl From<FilterSelection> for BTreeMap<String, Vec<String>> {
    fn from(selection: FilterSelection) -> Self {
        selection
            .categories
            .into_iter()
            .map(|(category, values)| (category.as_str().to_string(), values.into_iter().collect()))
            .collect()
    }
}
