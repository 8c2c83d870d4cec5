//! Selectable values per filter category, built from a collection.

use std::collections::{BTreeSet, HashSet};

use capsule_types::{CollectionItem, FilterCategory, HAS_MOMENTS, NO_MOMENTS};

/// One checkbox in a filter group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOption {
    pub title: String,
    pub value: String,
}

impl FilterOption {
    fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            title: value.clone(),
            value,
        }
    }
}

/// A category with its options, ready for a filter panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterGroup {
    pub category: FilterCategory,
    pub options: Vec<FilterOption>,
}

/// Options for one category.
///
/// Country, City and Chain keep first-seen order and use the same defaults as
/// the matcher. Years are newest first. Moments is a fixed pair.
pub fn options_for(category: FilterCategory, items: &[CollectionItem]) -> Vec<FilterOption> {
    match category {
        FilterCategory::Country => first_seen(items.iter().map(CollectionItem::country)),
        FilterCategory::City => first_seen(items.iter().map(CollectionItem::city)),
        FilterCategory::Chain => first_seen(items.iter().map(CollectionItem::chain)),
        FilterCategory::Year => {
            let years: BTreeSet<i32> = items.iter().map(CollectionItem::collected_year).collect();
            years
                .into_iter()
                .rev()
                .map(|year| FilterOption::same(year.to_string()))
                .collect()
        }
        FilterCategory::Moments => vec![
            FilterOption {
                title: "Has Moments".into(),
                value: HAS_MOMENTS.into(),
            },
            FilterOption {
                title: "No Moments".into(),
                value: NO_MOMENTS.into(),
            },
        ],
    }
}

/// Every category's options, in display order.
pub fn filter_groups(items: &[CollectionItem]) -> Vec<FilterGroup> {
    FilterCategory::ALL
        .into_iter()
        .map(|category| FilterGroup {
            category,
            options: options_for(category, items),
        })
        .collect()
}

fn first_seen<'a>(values: impl Iterator<Item = &'a str>) -> Vec<FilterOption> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(FilterOption::same)
        .collect()
}
